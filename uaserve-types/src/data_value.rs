//! The [`DataValue`] type, a variant with status and timestamps attached.

use std::io::{Read, Write};

use crate::{
    date_time::DateTime,
    encoding::{read_u8, write_u8, BinaryDecodable, BinaryEncodable, EncodingResult},
    service_types::TimestampsToReturn,
    status_code::StatusCode,
    variant::Variant,
};

bitflags::bitflags! {
    struct DataValueFlags: u8 {
        const HAS_VALUE = 0x1;
        const HAS_STATUS = 0x2;
        const HAS_SOURCE_TIMESTAMP = 0x4;
        const HAS_SERVER_TIMESTAMP = 0x8;
        const HAS_SOURCE_PICOSECONDS = 0x10;
        const HAS_SERVER_PICOSECONDS = 0x20;
    }
}

/// A value with optional status code and timestamps. Absent fields stay off
/// the wire; an absent status reads as `Good`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value. `None` when the read failed.
    pub value: Option<Variant>,
    /// The status associated with the value. `None` means Good.
    pub status: Option<StatusCode>,
    /// The time the value was sourced.
    pub source_timestamp: Option<DateTime>,
    /// Sub-tick precision of the source timestamp in 10 picosecond units.
    pub source_picoseconds: Option<i16>,
    /// The time the server received the value.
    pub server_timestamp: Option<DateTime>,
    /// Sub-tick precision of the server timestamp in 10 picosecond units.
    pub server_picoseconds: Option<i16>,
}

impl BinaryEncodable for DataValue {
    fn byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        let mut size = 1;
        if let Some(ref value) = self.value {
            size += value.byte_len(ctx);
        }
        if self.status.is_some() {
            size += 4;
        }
        if self.source_timestamp.is_some() {
            size += 8;
            if self.source_picoseconds.is_some() {
                size += 2;
            }
        }
        if self.server_timestamp.is_some() {
            size += 8;
            if self.server_picoseconds.is_some() {
                size += 2;
            }
        }
        size
    }

    fn encode<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        write_u8(stream, self.encoding_flags().bits())?;
        if let Some(ref value) = self.value {
            value.encode(stream, ctx)?;
        }
        if let Some(status) = self.status {
            status.encode(stream, ctx)?;
        }
        // Picoseconds are only written when their timestamp is written.
        if let Some(source_timestamp) = self.source_timestamp {
            source_timestamp.encode(stream, ctx)?;
            if let Some(source_picoseconds) = self.source_picoseconds {
                source_picoseconds.encode(stream, ctx)?;
            }
        }
        if let Some(server_timestamp) = self.server_timestamp {
            server_timestamp.encode(stream, ctx)?;
            if let Some(server_picoseconds) = self.server_picoseconds {
                server_picoseconds.encode(stream, ctx)?;
            }
        }
        Ok(())
    }
}

impl BinaryDecodable for DataValue {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &crate::Context<'_>) -> EncodingResult<Self> {
        let flags = DataValueFlags::from_bits_truncate(read_u8(stream)?);
        let mut value = DataValue::default();
        if flags.contains(DataValueFlags::HAS_VALUE) {
            value.value = Some(Variant::decode(stream, ctx)?);
        }
        if flags.contains(DataValueFlags::HAS_STATUS) {
            value.status = Some(StatusCode::decode(stream, ctx)?);
        }
        if flags.contains(DataValueFlags::HAS_SOURCE_TIMESTAMP) {
            value.source_timestamp = Some(DateTime::decode(stream, ctx)?);
            if flags.contains(DataValueFlags::HAS_SOURCE_PICOSECONDS) {
                value.source_picoseconds = Some(i16::decode(stream, ctx)?);
            }
        }
        if flags.contains(DataValueFlags::HAS_SERVER_TIMESTAMP) {
            value.server_timestamp = Some(DateTime::decode(stream, ctx)?);
            if flags.contains(DataValueFlags::HAS_SERVER_PICOSECONDS) {
                value.server_picoseconds = Some(i16::decode(stream, ctx)?);
            }
        }
        Ok(value)
    }
}

impl From<Variant> for DataValue {
    fn from(value: Variant) -> Self {
        DataValue {
            value: Some(value),
            ..Default::default()
        }
    }
}

macro_rules! impl_from_value {
    ($($tp:ty),*) => {
        $(
            impl From<$tp> for DataValue {
                fn from(value: $tp) -> Self {
                    DataValue::from(Variant::from(value))
                }
            }
        )*
    };
}

impl_from_value!(
    bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, &str, String,
    crate::string::UAString, crate::node_id::NodeId, crate::localized_text::LocalizedText,
    crate::qualified_name::QualifiedName
);

impl DataValue {
    /// Create a value with both timestamps set to now and status Good.
    pub fn new_now(value: impl Into<Variant>) -> DataValue {
        let now = DateTime::now();
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            server_timestamp: Some(now),
            ..Default::default()
        }
    }

    /// Create a value with the supplied timestamps and status Good.
    pub fn new_at(value: impl Into<Variant>, time: DateTime) -> DataValue {
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(time),
            server_timestamp: Some(time),
            ..Default::default()
        }
    }

    /// A value-less DataValue carrying only a status code.
    pub fn new_status(status: StatusCode) -> DataValue {
        DataValue {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The effective status of this value; absent means Good.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }

    /// `true` if the effective status is good.
    pub fn is_valid(&self) -> bool {
        self.status().is_good()
    }

    /// Strip the timestamps the client did not ask for.
    pub fn keep_timestamps(&mut self, timestamps_to_return: TimestampsToReturn) {
        match timestamps_to_return {
            TimestampsToReturn::Source => {
                self.server_timestamp = None;
                self.server_picoseconds = None;
            }
            TimestampsToReturn::Server => {
                self.source_timestamp = None;
                self.source_picoseconds = None;
            }
            TimestampsToReturn::Neither => {
                self.source_timestamp = None;
                self.source_picoseconds = None;
                self.server_timestamp = None;
                self.server_picoseconds = None;
            }
            TimestampsToReturn::Both | TimestampsToReturn::Invalid => {}
        }
    }

    fn encoding_flags(&self) -> DataValueFlags {
        let mut flags = DataValueFlags::empty();
        if self.value.is_some() {
            flags |= DataValueFlags::HAS_VALUE;
        }
        if self.status.is_some() {
            flags |= DataValueFlags::HAS_STATUS;
        }
        if self.source_timestamp.is_some() {
            flags |= DataValueFlags::HAS_SOURCE_TIMESTAMP;
            if self.source_picoseconds.is_some() {
                flags |= DataValueFlags::HAS_SOURCE_PICOSECONDS;
            }
        }
        if self.server_timestamp.is_some() {
            flags |= DataValueFlags::HAS_SERVER_TIMESTAMP;
            if self.server_picoseconds.is_some() {
                flags |= DataValueFlags::HAS_SERVER_PICOSECONDS;
            }
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::DataValue;
    use crate::{
        context::ContextOwned,
        encoding::{BinaryDecodable, BinaryEncodable},
        service_types::TimestampsToReturn,
        StatusCode,
    };

    #[test]
    fn round_trip() {
        let ctx_owned = ContextOwned::new_default();
        let ctx = ctx_owned.context();
        let v = DataValue::new_now(42i32);
        let buf = v.encode_to_vec(&ctx);
        assert_eq!(buf.len(), v.byte_len(&ctx));
        let mut stream = buf.as_slice();
        assert_eq!(DataValue::decode(&mut stream, &ctx).unwrap(), v);
    }

    #[test]
    fn absent_status_is_good() {
        let v = DataValue::from(1i32);
        assert_eq!(v.status(), StatusCode::Good);
        assert!(v.is_valid());
    }

    #[test]
    fn keep_timestamps() {
        let mut v = DataValue::new_now(1i32);
        v.keep_timestamps(TimestampsToReturn::Source);
        assert!(v.source_timestamp.is_some());
        assert!(v.server_timestamp.is_none());
    }
}
