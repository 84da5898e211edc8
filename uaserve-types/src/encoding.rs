//! The binary codec traits, [`DecodingOptions`], and helpers for reading and
//! writing scalar values.

use std::{
    error::Error as StdError,
    fmt::{Debug, Display},
    io::{Cursor, Read, Result, Write},
    sync::atomic::{AtomicU64, Ordering},
};

use byteorder::{ByteOrder, LittleEndian};
use log::error;

use crate::{constants, context::Context, qualified_name::QualifiedName, status_code::StatusCode};

/// Result of an encoding or decoding operation.
pub type EncodingResult<T> = std::result::Result<T, Error>;

/// General OPC UA error.
///
/// Carries a status code, a dynamic error source, and, where it could be
/// recovered, the request id and handle of the request the error belongs to.
#[derive(Debug)]
pub struct Error {
    status: StatusCode,
    request_id: Option<u32>,
    request_handle: Option<u32>,
    context: Box<dyn StdError + Send + Sync>,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.context)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.context)
    }
}

impl Error {
    /// Create a new error with the specified `status` code and
    /// `context` as a dynamic error source.
    pub fn new(status: StatusCode, context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            status,
            request_handle: None,
            request_id: None,
            context: context.into(),
        }
    }

    /// Create a new error with status code `BadDecodingError`.
    pub fn decoding(context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(StatusCode::BadDecodingError, context)
    }

    /// Create a new error with status code `BadEncodingError`.
    pub fn encoding(context: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(StatusCode::BadEncodingError, context)
    }

    /// Add request ID and request handle to this error.
    pub fn with_context(mut self, request_id: Option<u32>, request_handle: Option<u32>) -> Self {
        self.request_id = request_id;
        self.request_handle = request_handle;
        self
    }

    /// Add request ID to this error.
    pub fn with_request_id(mut self, id: u32) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Add request handle to this error.
    pub fn with_request_handle(mut self, handle: u32) -> Self {
        self.request_handle = Some(handle);
        self
    }

    /// Get the inner status code of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the request id and handle, if both are present.
    pub fn full_context(&self) -> Option<(u32, u32)> {
        if let (Some(id), Some(handle)) = (self.request_id, self.request_handle) {
            Some((id, handle))
        } else {
            None
        }
    }
}

impl From<Error> for StatusCode {
    fn from(value: Error) -> Self {
        error!("{}", value);
        value.status()
    }
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        value.status().into()
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::decoding(value)
    }
}

impl From<StatusCode> for Error {
    fn from(value: StatusCode) -> Self {
        Self::new(value, value.to_string())
    }
}

/// Requested data encoding in a service call, parsed from a browse name.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DataEncoding {
    /// Binary data encoding, the only one this stack produces.
    #[default]
    Binary,
    /// Some other data encoding, identified by browse name.
    Other(QualifiedName),
}

impl DataEncoding {
    /// Parse the data encoding from a browse name in a service call.
    pub fn from_browse_name(name: QualifiedName) -> std::result::Result<Self, StatusCode> {
        match name.name.as_ref() {
            "Default Binary" | "" => Ok(Self::Binary),
            _ if name.namespace_index != 0 => Ok(Self::Other(name)),
            _ => Err(StatusCode::BadDataEncodingInvalid),
        }
    }
}

/// Holds a reference on the depth gauge. The drop impl ensures the count is
/// decremented even during a panic unwind.
#[derive(Debug)]
pub struct DepthLock<'a> {
    depth_gauge: &'a DepthGauge,
}

impl Drop for DepthLock<'_> {
    fn drop(&mut self) {
        self.depth_gauge
            .current_depth
            .fetch_sub(1, Ordering::Release);
    }
}

impl<'a> DepthLock<'a> {
    /// Try to increment the depth, failing if max depth is exceeded.
    /// Current depth is decremented when the returned lock drops.
    pub fn obtain(depth_gauge: &'a DepthGauge) -> core::result::Result<DepthLock<'a>, Error> {
        let current = depth_gauge.current_depth.fetch_add(1, Ordering::Acquire);
        let lock = Self { depth_gauge };

        if current >= depth_gauge.max_depth {
            Err(Error::decoding(
                "Maximum recursion depth reached while decoding",
            ))
        } else {
            Ok(lock)
        }
    }
}

/// Limits the nesting depth the decoder will follow through recursive
/// structures such as Variant and ExtensionObject.
#[derive(Debug)]
pub struct DepthGauge {
    max_depth: u64,
    current_depth: AtomicU64,
}

impl Clone for DepthGauge {
    fn clone(&self) -> Self {
        Self {
            max_depth: self.max_depth,
            current_depth: AtomicU64::new(0),
        }
    }
}

impl Default for DepthGauge {
    fn default() -> Self {
        Self::new(constants::MAX_DECODING_DEPTH)
    }
}

impl DepthGauge {
    /// Create a new depth gauge with the specified max depth.
    pub fn new(max_depth: u64) -> Self {
        Self {
            max_depth,
            current_depth: AtomicU64::new(0),
        }
    }

    /// Get the max depth of the gauge.
    pub fn max_depth(&self) -> u64 {
        self.max_depth
    }
}

/// General decoding options, typically negotiated during the transport
/// handshake.
#[derive(Clone, Debug)]
pub struct DecodingOptions {
    /// Maximum size of a message in bytes. 0 means no limit.
    pub max_message_size: usize,
    /// Maximum number of chunks in a message. 0 means no limit.
    pub max_chunk_count: usize,
    /// Maximum length in bytes (not chars!) of a string. 0 means no string permitted.
    pub max_string_length: usize,
    /// Maximum length in bytes of a byte string. 0 means no byte string permitted.
    pub max_byte_string_length: usize,
    /// Maximum number of array elements. 0 means no array permitted.
    pub max_array_length: usize,
    /// Gauge used to check for recursion while decoding.
    pub decoding_depth_gauge: DepthGauge,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        DecodingOptions {
            max_message_size: constants::MAX_MESSAGE_SIZE,
            max_chunk_count: constants::MAX_CHUNK_COUNT,
            max_string_length: constants::MAX_STRING_LENGTH,
            max_byte_string_length: constants::MAX_BYTE_STRING_LENGTH,
            max_array_length: constants::MAX_ARRAY_LENGTH,
            decoding_depth_gauge: DepthGauge::default(),
        }
    }
}

impl DecodingOptions {
    /// Useful for decoding extension objects whose payload is not expected
    /// to contain large values.
    pub fn minimal() -> Self {
        DecodingOptions {
            max_string_length: 8192,
            max_byte_string_length: 8192,
            max_array_length: 8192,
            decoding_depth_gauge: DepthGauge::new(1),
            ..Default::default()
        }
    }

    /// Get a lease on the decoding depth. Fails if max depth is exceeded.
    pub fn depth_lock(&self) -> core::result::Result<DepthLock<'_>, Error> {
        DepthLock::obtain(&self.decoding_depth_gauge)
    }
}

/// OPC UA binary encoding interface. Anything that encodes to binary
/// implements this.
///
/// # Implementing
///
/// Most implementers should use `derive(BinaryEncodable)`. A manual
/// implementation _must_ satisfy the following:
///
///  - `byte_len` must return a length exactly equal to what `encode` will
///    write, or `encode` must be guaranteed to fail.
///  - `encode` must use `write_all` on the stream, not just `write`, so that
///    all the data is written even if the stream is interrupted.
pub trait BinaryEncodable {
    /// Returns the exact byte length of the value as `encode` would write it.
    #[allow(unused)]
    fn byte_len(&self, ctx: &Context<'_>) -> usize;

    /// Encodes the value to the write stream.
    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()>;

    /// Convenience method encoding the value straight into a byte vector.
    /// Prefer reusing buffers outside of tests and trivial code.
    fn encode_to_vec(&self, ctx: &Context<'_>) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::with_capacity(self.byte_len(ctx)));
        let _ = self.encode(&mut buffer, ctx);
        buffer.into_inner()
    }
}

/// Trait for decoding a value from OPC UA binary.
pub trait BinaryDecodable: Sized {
    /// Decodes a value from the read stream. The decoding options in the
    /// context contain restrictions on the length of strings, arrays etc.
    /// set by the server or client; exceeding them fails the decode.
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self>;
}

/// Encoding for types that cannot contain dynamic values. Used by framing
/// level messages which are encoded before any context exists.
pub trait SimpleBinaryEncodable {
    /// Returns the exact byte length of the value as `encode` would write it.
    #[allow(unused)]
    fn byte_len(&self) -> usize;

    /// Encodes the value to the write stream.
    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()>;

    /// Convenience method encoding the value straight into a byte vector.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::with_capacity(self.byte_len()));
        let _ = self.encode(&mut buffer);
        buffer.into_inner()
    }
}

impl<T> BinaryEncodable for T
where
    T: SimpleBinaryEncodable,
{
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        SimpleBinaryEncodable::byte_len(self)
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        SimpleBinaryEncodable::encode(self, stream)
    }
}

/// Decoding for types that cannot contain dynamic values.
pub trait SimpleBinaryDecodable: Sized {
    /// Decode Self from the byte stream.
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self>;
}

impl<T> BinaryDecodable for T
where
    T: SimpleBinaryDecodable,
{
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        SimpleBinaryDecodable::decode(stream, ctx.options())
    }
}

/// Converts an IO encoding error into an EncodingResult.
pub fn process_encode_io_result(result: Result<()>) -> EncodingResult<()> {
    result.map_err(Error::encoding)
}

/// Converts an IO decoding error into an EncodingResult.
pub fn process_decode_io_result<T>(result: Result<T>) -> EncodingResult<T>
where
    T: Debug,
{
    result.map_err(Error::decoding)
}

impl<T> BinaryEncodable for Option<Vec<T>>
where
    T: BinaryEncodable,
{
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        let mut size = 4;
        if let Some(ref values) = self {
            size += values.iter().map(|v| v.byte_len(ctx)).sum::<usize>();
        }
        size
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        if let Some(ref values) = self {
            write_i32(stream, values.len() as i32)?;
            for value in values.iter() {
                value.encode(stream, ctx)?;
            }
        } else {
            write_i32(stream, -1)?;
        }
        Ok(())
    }
}

impl<T> BinaryDecodable for Option<Vec<T>>
where
    T: BinaryDecodable,
{
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<Option<Vec<T>>> {
        let len = read_i32(stream)?;
        if len == -1 {
            Ok(None)
        } else if len < -1 {
            Err(Error::decoding(
                "Array length is negative value and invalid",
            ))
        } else if len as usize > ctx.options().max_array_length {
            Err(Error::decoding(format!(
                "Array length {} exceeds decoding limit {}",
                len,
                ctx.options().max_array_length
            )))
        } else {
            let mut values: Vec<T> = Vec::with_capacity(len as usize);
            for _ in 0..len {
                values.push(T::decode(stream, ctx)?);
            }
            Ok(Some(values))
        }
    }
}

/// Writes a series of identical bytes to the stream.
pub fn write_bytes<W: Write + ?Sized>(
    stream: &mut W,
    value: u8,
    count: usize,
) -> EncodingResult<usize> {
    for _ in 0..count {
        process_encode_io_result(stream.write_all(&[value]))?;
    }
    Ok(count)
}

/// Writes an unsigned byte to the stream.
pub fn write_u8<T, W: Write + ?Sized>(stream: &mut W, value: T) -> EncodingResult<()>
where
    T: Into<u8>,
{
    let buf: [u8; 1] = [value.into()];
    process_encode_io_result(stream.write_all(&buf))
}

macro_rules! write_le {
    ($name:ident, $tp:ty, $size:expr, $write:ident) => {
        #[doc = concat!("Writes a `", stringify!($tp), "` to the stream as little endian.")]
        pub fn $name<T, W: Write + ?Sized>(stream: &mut W, value: T) -> EncodingResult<()>
        where
            T: Into<$tp>,
        {
            let mut buf = [0u8; $size];
            LittleEndian::$write(&mut buf, value.into());
            process_encode_io_result(stream.write_all(&buf))
        }
    };
}

write_le!(write_i16, i16, 2, write_i16);
write_le!(write_u16, u16, 2, write_u16);
write_le!(write_i32, i32, 4, write_i32);
write_le!(write_u32, u32, 4, write_u32);
write_le!(write_i64, i64, 8, write_i64);
write_le!(write_u64, u64, 8, write_u64);
write_le!(write_f32, f32, 4, write_f32);
write_le!(write_f64, f64, 8, write_f64);

/// Reads an array of bytes from the stream.
pub fn read_bytes<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> EncodingResult<usize> {
    let result = stream.read_exact(buf);
    process_decode_io_result(result)?;
    Ok(buf.len())
}

/// Read an unsigned byte from the stream.
pub fn read_u8<R: Read + ?Sized>(stream: &mut R) -> EncodingResult<u8> {
    let mut buf = [0u8];
    let result = stream.read_exact(&mut buf);
    process_decode_io_result(result)?;
    Ok(buf[0])
}

macro_rules! read_le {
    ($name:ident, $tp:ty, $size:expr, $read:ident) => {
        #[doc = concat!("Reads a little endian `", stringify!($tp), "` from the stream.")]
        pub fn $name<R: Read + ?Sized>(stream: &mut R) -> EncodingResult<$tp> {
            let mut buf = [0u8; $size];
            let result = stream.read_exact(&mut buf);
            process_decode_io_result(result)?;
            Ok(LittleEndian::$read(&buf))
        }
    };
}

read_le!(read_i16, i16, 2, read_i16);
read_le!(read_u16, u16, 2, read_u16);
read_le!(read_i32, i32, 4, read_i32);
read_le!(read_u32, u32, 4, read_u32);
read_le!(read_i64, i64, 8, read_i64);
read_le!(read_u64, u64, 8, read_u64);
read_le!(read_f32, f32, 4, read_f32);
read_le!(read_f64, f64, 8, read_f64);

#[cfg(test)]
mod tests {
    use super::{DepthGauge, DepthLock};
    use crate::status_code::StatusCode;

    #[test]
    fn depth_gauge() {
        let dg = DepthGauge::new(17);

        let max_depth = dg.max_depth();
        assert_eq!(max_depth, 17);

        {
            let mut v = Vec::new();
            for _ in 0..max_depth {
                v.push(DepthLock::obtain(&dg).unwrap());
            }

            // Next obtain should fail
            assert_eq!(
                DepthLock::obtain(&dg).unwrap_err().status(),
                StatusCode::BadDecodingError
            );

            // Locks drop here
        }

        // Depth should be zero again, so the max can be obtained once more
        let _l = DepthLock::obtain(&dg).unwrap();
    }
}
