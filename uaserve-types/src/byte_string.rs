//! The [`ByteString`] type, an opaque sequence of bytes with a distinct
//! null representation.

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::encoding::{
    process_decode_io_result, process_encode_io_result, read_i32, write_i32, DecodingOptions,
    EncodingResult, Error, SimpleBinaryDecodable, SimpleBinaryEncodable,
};
use crate::guid::Guid;

/// A sequence of octets, either null or zero or more bytes.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default, PartialOrd, Ord)]
pub struct ByteString {
    /// The raw bytes, `None` for the null byte string.
    pub value: Option<Vec<u8>>,
}

impl SimpleBinaryEncodable for ByteString {
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
                process_encode_io_result(stream.write_all(value))
            }
            None => write_i32(stream, -1),
        }
    }
}

impl SimpleBinaryDecodable for ByteString {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let len = read_i32(stream)?;
        // Null bytestring
        if len == -1 {
            return Ok(ByteString::null());
        }
        if len < -1 {
            return Err(Error::decoding(format!(
                "ByteString buffer has invalid length {len}"
            )));
        }
        if len as usize > decoding_options.max_byte_string_length {
            return Err(Error::decoding(format!(
                "ByteString length {} exceeds decoding limit {}",
                len, decoding_options.max_byte_string_length
            )));
        }
        let mut value = vec![0u8; len as usize];
        process_decode_io_result(stream.read_exact(&mut value))?;
        Ok(ByteString { value: Some(value) })
    }
}

impl<'a, T> From<&'a T> for ByteString
where
    T: AsRef<[u8]> + ?Sized,
{
    fn from(value: &'a T) -> Self {
        ByteString::from(value.as_ref().to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl From<Guid> for ByteString {
    fn from(value: Guid) -> Self {
        ByteString::from(value.as_bytes().as_slice())
    }
}

impl TryFrom<&ByteString> for Guid {
    type Error = ();

    fn try_from(value: &ByteString) -> Result<Self, Self::Error> {
        let bytes = value.as_ref();
        if bytes.len() != 16 {
            return Err(());
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(bytes);
        Ok(Guid::from(buf))
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl ByteString {
    /// The null byte string.
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// `true` if the byte string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// `true` if the byte string is null or zero length.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }

    /// Create a byte string from its base64 representation.
    pub fn from_base64(data: &str) -> Option<ByteString> {
        STANDARD.decode(data).map(ByteString::from).ok()
    }

    /// Encode the byte string as base64.
    pub fn as_base64(&self) -> String {
        STANDARD.encode(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::ByteString;

    #[test]
    fn base64_round_trip() {
        let v = ByteString::from(vec![1u8, 2, 3, 254]);
        assert_eq!(ByteString::from_base64(&v.as_base64()).unwrap(), v);
    }
}
