//! Default limits for the codec and transport.

/// Default maximum message size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;
/// Default maximum number of chunks per message.
pub const MAX_CHUNK_COUNT: usize = 64;
/// Default maximum length in bytes of a decoded string.
pub const MAX_STRING_LENGTH: usize = 65536;
/// Default maximum length in bytes of a decoded byte string.
pub const MAX_BYTE_STRING_LENGTH: usize = 65536;
/// Default maximum number of elements in a decoded array.
pub const MAX_ARRAY_LENGTH: usize = 65536;
/// Default maximum nesting depth for recursive structures.
pub const MAX_DECODING_DEPTH: u64 = 10;
