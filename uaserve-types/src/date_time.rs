//! The [`DateTime`] type, a UTC timestamp measured in 100 nanosecond ticks
//! from January 1, 1601.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use chrono::{Duration, TimeZone, Timelike, Utc};

use crate::encoding::{
    read_i64, write_i64, DecodingOptions, EncodingResult, SimpleBinaryDecodable,
    SimpleBinaryEncodable,
};

const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;

/// Maximum tick count, corresponding to the end of the year 9999. Values at
/// or past this are treated as "no timestamp" per part 6.
const MAX_TICKS: i64 = 2_650_467_743_990_000_000;

/// An OPC UA DateTime: 100 nanosecond ticks since 1601-01-01 00:00:00 UTC.
#[derive(PartialEq, PartialOrd, Eq, Ord, Debug, Clone, Copy)]
pub struct DateTime {
    date_time: chrono::DateTime<Utc>,
}

impl Default for DateTime {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.date_time.to_rfc3339())
    }
}

impl SimpleBinaryEncodable for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_i64(stream, self.checked_ticks())
    }
}

impl SimpleBinaryDecodable for DateTime {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        let ticks = read_i64(stream)?;
        Ok(DateTime::from_ticks(ticks))
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(date_time: chrono::DateTime<Utc>) -> Self {
        // Truncate to the tick resolution so equality survives a round trip.
        let nanos = date_time.nanosecond() as i64 % NANOS_PER_TICK;
        DateTime {
            date_time: date_time - Duration::nanoseconds(nanos),
        }
    }
}

impl From<DateTime> for chrono::DateTime<Utc> {
    fn from(value: DateTime) -> Self {
        value.date_time
    }
}

impl FromStr for DateTime {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| DateTime::from(dt.with_timezone(&Utc)))
            .map_err(|_| ())
    }
}

impl DateTime {
    /// The current wall clock time.
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// The OPC UA epoch, 1601-01-01 00:00:00 UTC. Also the null timestamp.
    pub fn epoch() -> DateTime {
        DateTime::from_ticks(0)
    }

    /// Construct from a tick count relative to the 1601 epoch. Values
    /// outside the representable range clamp to the epoch / end of time.
    pub fn from_ticks(ticks: i64) -> DateTime {
        let ticks = ticks.clamp(0, MAX_TICKS);
        let secs = ticks / TICKS_PER_SECOND;
        let nanos = (ticks % TICKS_PER_SECOND) * NANOS_PER_TICK;
        DateTime {
            date_time: epoch_chrono() + Duration::seconds(secs) + Duration::nanoseconds(nanos),
        }
    }

    /// The tick count relative to the 1601 epoch.
    pub fn ticks(&self) -> i64 {
        let delta = self.date_time.signed_duration_since(epoch_chrono());
        let secs = delta.num_seconds();
        let subsec = (delta - Duration::seconds(secs))
            .num_nanoseconds()
            .unwrap_or(0);
        secs * TICKS_PER_SECOND + subsec / NANOS_PER_TICK
    }

    /// The tick count clamped to the range OPC UA considers meaningful;
    /// out-of-range values become 0 or the end-of-time marker.
    pub fn checked_ticks(&self) -> i64 {
        self.ticks().clamp(0, MAX_TICKS)
    }

    /// `true` if this is the null timestamp.
    pub fn is_null(&self) -> bool {
        self.checked_ticks() == 0
    }

    /// This timestamp as a chrono UTC date time.
    pub fn as_chrono(&self) -> chrono::DateTime<Utc> {
        self.date_time
    }
}

fn epoch_chrono() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::DateTime;
    use crate::encoding::{DecodingOptions, SimpleBinaryDecodable, SimpleBinaryEncodable};

    #[test]
    fn epoch_is_zero() {
        assert_eq!(DateTime::epoch().ticks(), 0);
        assert!(DateTime::epoch().is_null());
    }

    #[test]
    fn now_is_after_unix_epoch() {
        // 1970 - 1601 in ticks
        const UNIX_OFFSET: i64 = 116_444_736_000_000_000;
        assert!(DateTime::now().ticks() > UNIX_OFFSET);
    }

    #[test]
    fn round_trip() {
        let now = DateTime::now();
        let buf = now.encode_to_vec();
        let mut stream = buf.as_slice();
        let decoded = DateTime::decode(&mut stream, &DecodingOptions::default()).unwrap();
        assert_eq!(decoded, now);
    }
}
