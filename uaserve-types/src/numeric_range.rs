//! The [`NumericRange`] type, an index range applied to the value of an
//! array attribute in Read, Write and monitored item operations.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::status_code::StatusCode;

/// An index range as described in part 4 7.22. Dimensions are separated by
/// `,`, each dimension is either a single index or `min:max` with
/// `min < max`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NumericRange {
    /// No range, the entire value.
    #[default]
    None,
    /// A single index.
    Index(u32),
    /// A range of indices, inclusive on both ends.
    Range(u32, u32),
    /// One range per dimension of a multi dimensional array.
    MultipleRanges(Vec<NumericRange>),
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericRange::None => Ok(()),
            NumericRange::Index(idx) => write!(f, "{}", idx),
            NumericRange::Range(min, max) => write!(f, "{}:{}", min, max),
            NumericRange::MultipleRanges(ranges) => {
                let mut first = true;
                for range in ranges {
                    if !first {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", range)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<min>[0-9]+)(:(?P<max>[0-9]+))?$").unwrap());

impl FromStr for NumericRange {
    type Err = StatusCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(NumericRange::None);
        }
        let parts: Vec<&str> = s.split(',').collect();
        match parts.len() {
            1 => Self::parse_dimension(parts[0]),
            2..=4 => {
                let ranges = parts
                    .iter()
                    .map(|p| Self::parse_dimension(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(NumericRange::MultipleRanges(ranges))
            }
            _ => Err(StatusCode::BadIndexRangeInvalid),
        }
    }
}

impl NumericRange {
    fn parse_dimension(s: &str) -> Result<NumericRange, StatusCode> {
        let captures = RANGE_RE
            .captures(s)
            .ok_or(StatusCode::BadIndexRangeInvalid)?;
        let min = captures
            .name("min")
            .unwrap()
            .as_str()
            .parse::<u32>()
            .map_err(|_| StatusCode::BadIndexRangeInvalid)?;
        match captures.name("max") {
            None => Ok(NumericRange::Index(min)),
            Some(max) => {
                let max = max
                    .as_str()
                    .parse::<u32>()
                    .map_err(|_| StatusCode::BadIndexRangeInvalid)?;
                // Part 4: min must be strictly less than max
                if min >= max {
                    Err(StatusCode::BadIndexRangeInvalid)
                } else {
                    Ok(NumericRange::Range(min, max))
                }
            }
        }
    }

    /// `true` if no range is set.
    pub fn is_none(&self) -> bool {
        matches!(self, NumericRange::None)
    }

    /// `true` if the range is structurally valid.
    pub fn is_valid(&self) -> bool {
        match self {
            NumericRange::None | NumericRange::Index(_) => true,
            NumericRange::Range(min, max) => min < max,
            NumericRange::MultipleRanges(ranges) => ranges.iter().all(|r| r.is_valid()),
        }
    }

    /// The range of the first (or only) dimension as an inclusive
    /// `(min, max)` pair.
    pub fn as_min_max(&self) -> Option<(usize, usize)> {
        match self {
            NumericRange::None => None,
            NumericRange::Index(idx) => Some((*idx as usize, *idx as usize)),
            NumericRange::Range(min, max) => Some((*min as usize, *max as usize)),
            NumericRange::MultipleRanges(ranges) => ranges.first().and_then(|r| r.as_min_max()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NumericRange;
    use std::str::FromStr;

    #[test]
    fn parse() {
        assert_eq!(NumericRange::from_str("").unwrap(), NumericRange::None);
        assert_eq!(NumericRange::from_str("5").unwrap(), NumericRange::Index(5));
        assert_eq!(
            NumericRange::from_str("2:10").unwrap(),
            NumericRange::Range(2, 10)
        );
        assert_eq!(
            NumericRange::from_str("1:2,0:4").unwrap(),
            NumericRange::MultipleRanges(vec![
                NumericRange::Range(1, 2),
                NumericRange::Range(0, 4)
            ])
        );
    }

    #[test]
    fn rejects_invalid() {
        assert!(NumericRange::from_str("5:5").is_err());
        assert!(NumericRange::from_str("10:1").is_err());
        assert!(NumericRange::from_str("a").is_err());
        assert!(NumericRange::from_str("1:").is_err());
        assert!(NumericRange::from_str(":5").is_err());
    }
}
