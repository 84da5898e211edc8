//! The [`UAString`] type, a string with a distinct null representation.

use std::{
    fmt,
    io::{Read, Write},
};

use crate::encoding::{
    process_decode_io_result, process_encode_io_result, read_i32, write_i32, DecodingOptions,
    EncodingResult, Error, SimpleBinaryDecodable, SimpleBinaryEncodable,
};

/// An OPC UA string is either null or a UTF-8 string. Null and the empty
/// string are distinct values on the wire.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, PartialOrd, Ord)]
pub struct UAString {
    value: Option<String>,
}

/// An XML element is transported as a string.
pub type XmlElement = UAString;

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.value {
            Some(ref value) => write!(f, "{}", value),
            None => write!(f, "[null]"),
        }
    }
}

impl SimpleBinaryEncodable for UAString {
    fn byte_len(&self) -> usize {
        4 + match self.value {
            Some(ref value) => value.len(),
            None => 0,
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        match self.value {
            Some(ref value) => {
                write_i32(stream, value.len() as i32)?;
                process_encode_io_result(stream.write_all(value.as_bytes()))
            }
            None => write_i32(stream, -1),
        }
    }
}

impl SimpleBinaryDecodable for UAString {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let len = read_i32(stream)?;
        // Null string
        if len == -1 {
            return Ok(UAString::null());
        }
        if len < -1 {
            return Err(Error::decoding(format!(
                "String buffer has invalid length {len}"
            )));
        }
        if len as usize > decoding_options.max_string_length {
            return Err(Error::decoding(format!(
                "String buffer length {} exceeds decoding limit {}",
                len, decoding_options.max_string_length
            )));
        }
        let mut buf = vec![0u8; len as usize];
        process_decode_io_result(stream.read_exact(&mut buf))?;
        let value =
            String::from_utf8(buf).map_err(|_| Error::decoding("String buffer is not UTF-8"))?;
        Ok(UAString::from(value))
    }
}

impl From<&str> for UAString {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_owned()),
        }
    }
}

impl From<&String> for UAString {
    fn from(value: &String) -> Self {
        Self {
            value: Some(value.clone()),
        }
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        Self { value: Some(value) }
    }
}

impl From<Option<String>> for UAString {
    fn from(value: Option<String>) -> Self {
        Self { value }
    }
}

impl From<UAString> for String {
    fn from(value: UAString) -> Self {
        value.as_ref().to_string()
    }
}

impl AsRef<str> for UAString {
    fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl PartialEq<str> for UAString {
    fn eq(&self, other: &str) -> bool {
        self.as_ref() == other
    }
}

impl UAString {
    /// The inner value, `None` for a null string.
    pub fn value(&self) -> &Option<String> {
        &self.value
    }

    /// Set the inner value.
    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    /// `true` if the string is null. Null is distinct from being empty.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// The null string.
    pub fn null() -> UAString {
        UAString { value: None }
    }

    /// `true` if the string is empty. Null strings count as empty.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }

    /// The length of the string in bytes, or -1 for null.
    pub fn len(&self) -> isize {
        self.value.as_ref().map(|v| v.len() as isize).unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::UAString;
    use crate::encoding::{DecodingOptions, SimpleBinaryDecodable, SimpleBinaryEncodable};

    #[test]
    fn null_and_empty_are_distinct() {
        let null = UAString::null();
        let empty = UAString::from("");
        assert!(null.is_null() && null.is_empty());
        assert!(!empty.is_null() && empty.is_empty());
        assert_ne!(null, empty);

        assert_eq!(null.encode_to_vec(), vec![0xff, 0xff, 0xff, 0xff]);
        assert_eq!(empty.encode_to_vec(), vec![0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn string_limits() {
        let opts = DecodingOptions {
            max_string_length: 2,
            ..Default::default()
        };
        let buf = UAString::from("abc").encode_to_vec();
        let mut stream = buf.as_slice();
        assert!(UAString::decode(&mut stream, &opts).is_err());
    }
}
