//! The [`LocalizedText`] type, human readable text with an optional locale.

use std::{
    fmt,
    io::{Read, Write},
};

use crate::{
    encoding::{
        read_u8, write_u8, DecodingOptions, EncodingResult, SimpleBinaryDecodable,
        SimpleBinaryEncodable,
    },
    string::UAString,
};

/// Human readable text with an optional locale identifier. Either field may
/// be absent, and absent fields are left off the wire entirely.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Default)]
pub struct LocalizedText {
    /// The locale, e.g. "en".
    pub locale: UAString,
    /// The text in that locale.
    pub text: UAString,
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

// Presence bits in the leading encoding mask byte.
const HAS_LOCALE: u8 = 0x1;
const HAS_TEXT: u8 = 0x2;

impl SimpleBinaryEncodable for LocalizedText {
    fn byte_len(&self) -> usize {
        let mut size = 1;
        if !self.locale.is_null() {
            size += self.locale.byte_len();
        }
        if !self.text.is_null() {
            size += self.text.byte_len();
        }
        size
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        let mut encoding_mask: u8 = 0;
        if !self.locale.is_null() {
            encoding_mask |= HAS_LOCALE;
        }
        if !self.text.is_null() {
            encoding_mask |= HAS_TEXT;
        }
        write_u8(stream, encoding_mask)?;
        if !self.locale.is_null() {
            self.locale.encode(stream)?;
        }
        if !self.text.is_null() {
            self.text.encode(stream)?;
        }
        Ok(())
    }
}

impl SimpleBinaryDecodable for LocalizedText {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let encoding_mask = read_u8(stream)?;
        let locale = if encoding_mask & HAS_LOCALE != 0 {
            UAString::decode(stream, decoding_options)?
        } else {
            UAString::null()
        };
        let text = if encoding_mask & HAS_TEXT != 0 {
            UAString::decode(stream, decoding_options)?
        } else {
            UAString::null()
        };
        Ok(LocalizedText { locale, text })
    }
}

impl<'a> From<&'a str> for LocalizedText {
    fn from(value: &'a str) -> Self {
        Self {
            locale: UAString::null(),
            text: UAString::from(value),
        }
    }
}

impl From<String> for LocalizedText {
    fn from(value: String) -> Self {
        Self {
            locale: UAString::null(),
            text: UAString::from(value),
        }
    }
}

impl LocalizedText {
    /// Create a new localized text with a locale.
    pub fn new(locale: &str, text: &str) -> LocalizedText {
        LocalizedText {
            locale: UAString::from(locale),
            text: UAString::from(text),
        }
    }

    /// The null localized text, with neither locale nor text.
    pub fn null() -> LocalizedText {
        LocalizedText {
            locale: UAString::null(),
            text: UAString::null(),
        }
    }

    /// `true` if both fields are null.
    pub fn is_null(&self) -> bool {
        self.locale.is_null() && self.text.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::LocalizedText;
    use crate::encoding::{DecodingOptions, SimpleBinaryDecodable, SimpleBinaryEncodable};

    #[test]
    fn absent_fields_stay_off_the_wire() {
        let text = LocalizedText::from("hello");
        let buf = text.encode_to_vec();
        // mask + string length + "hello"
        assert_eq!(buf.len(), 1 + 4 + 5);
        assert_eq!(buf[0], 0x2);

        let mut stream = buf.as_slice();
        let decoded = LocalizedText::decode(&mut stream, &DecodingOptions::default()).unwrap();
        assert_eq!(decoded, text);
        assert!(decoded.locale.is_null());
    }
}
