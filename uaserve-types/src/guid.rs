//! The [`Guid`] type, a 16 byte globally unique identifier.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use uuid::Uuid;

use crate::encoding::{
    process_decode_io_result, process_encode_io_result, DecodingOptions, EncodingResult,
    SimpleBinaryDecodable, SimpleBinaryEncodable,
};

/// A 16 byte globally unique identifier.
#[derive(Eq, PartialEq, Clone, Hash, Default, PartialOrd, Ord)]
pub struct Guid {
    uuid: Uuid,
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl SimpleBinaryEncodable for Guid {
    fn byte_len(&self) -> usize {
        16
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        // The first three fields are encoded little endian, the remaining
        // eight bytes are written as-is.
        let (data1, data2, data3, data4) = self.uuid.as_fields();
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&data1.to_le_bytes());
        buf[4..6].copy_from_slice(&data2.to_le_bytes());
        buf[6..8].copy_from_slice(&data3.to_le_bytes());
        buf[8..16].copy_from_slice(data4);
        process_encode_io_result(stream.write_all(&buf))
    }
}

impl SimpleBinaryDecodable for Guid {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        let mut buf = [0u8; 16];
        process_decode_io_result(stream.read_exact(&mut buf))?;
        let data1 = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let data2 = u16::from_le_bytes([buf[4], buf[5]]);
        let data3 = u16::from_le_bytes([buf[6], buf[7]]);
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&buf[8..16]);
        Ok(Guid {
            uuid: Uuid::from_fields(data1, data2, data3, &data4),
        })
    }
}

impl FromStr for Guid {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(|uuid| Guid { uuid }).map_err(|_| ())
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Guid { uuid }
    }
}

impl From<[u8; 16]> for Guid {
    fn from(bytes: [u8; 16]) -> Self {
        Guid {
            uuid: Uuid::from_bytes(bytes),
        }
    }
}

impl Guid {
    /// Return a null Guid, i.e. 00000000-0000-0000-0000-000000000000.
    pub fn null() -> Guid {
        Guid { uuid: Uuid::nil() }
    }

    /// Return a new random Guid.
    pub fn new() -> Guid {
        Guid {
            uuid: Uuid::new_v4(),
        }
    }

    /// Return the bytes of the Guid.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.uuid.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::Guid;
    use crate::encoding::{DecodingOptions, SimpleBinaryDecodable, SimpleBinaryEncodable};
    use std::str::FromStr;

    #[test]
    fn field_order_on_the_wire() {
        // Example from part 6: 72962B91-FA75-4AE6-8D28-B404DC7DAF63
        let guid = Guid::from_str("72962B91-FA75-4AE6-8D28-B404DC7DAF63").unwrap();
        let encoded = guid.encode_to_vec();
        assert_eq!(
            encoded,
            vec![
                0x91, 0x2B, 0x96, 0x72, 0x75, 0xFA, 0xE6, 0x4A, 0x8D, 0x28, 0xB4, 0x04, 0xDC,
                0x7D, 0xAF, 0x63
            ]
        );

        let mut stream = encoded.as_slice();
        let decoded = Guid::decode(&mut stream, &DecodingOptions::default()).unwrap();
        assert_eq!(decoded, guid);
    }
}
