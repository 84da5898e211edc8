//! Codec implementations for the primitive built-in types.

use std::io::{Read, Write};

use crate::encoding::{
    read_f32, read_f64, read_i16, read_i32, read_i64, read_u16, read_u32, read_u64, read_u8,
    write_f32, write_f64, write_i16, write_i32, write_i64, write_u16, write_u32, write_u64,
    write_u8, DecodingOptions, EncodingResult, SimpleBinaryDecodable, SimpleBinaryEncodable,
};

// Bools are encoded as a single byte, 0 or 1.
impl SimpleBinaryEncodable for bool {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_u8(stream, u8::from(*self))
    }
}

impl SimpleBinaryDecodable for bool {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        // Any non-zero value reads as true, per part 6.
        Ok(read_u8(stream)? != 0)
    }
}

impl SimpleBinaryEncodable for u8 {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_u8(stream, *self)
    }
}

impl SimpleBinaryDecodable for u8 {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        read_u8(stream)
    }
}

impl SimpleBinaryEncodable for i8 {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_u8(stream, *self as u8)
    }
}

impl SimpleBinaryDecodable for i8 {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(read_u8(stream)? as i8)
    }
}

macro_rules! primitive_codec {
    ($tp:ty, $size:expr, $write:ident, $read:ident) => {
        impl SimpleBinaryEncodable for $tp {
            fn byte_len(&self) -> usize {
                $size
            }

            fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
                $write(stream, *self)
            }
        }

        impl SimpleBinaryDecodable for $tp {
            fn decode<S: Read + ?Sized>(
                stream: &mut S,
                _: &DecodingOptions,
            ) -> EncodingResult<Self> {
                $read(stream)
            }
        }
    };
}

primitive_codec!(i16, 2, write_i16, read_i16);
primitive_codec!(u16, 2, write_u16, read_u16);
primitive_codec!(i32, 4, write_i32, read_i32);
primitive_codec!(u32, 4, write_u32, read_u32);
primitive_codec!(i64, 8, write_i64, read_i64);
primitive_codec!(u64, 8, write_u64, read_u64);
primitive_codec!(f32, 4, write_f32, read_f32);
primitive_codec!(f64, 8, write_f64, read_f64);
