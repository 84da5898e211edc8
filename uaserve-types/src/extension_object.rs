//! The [`ExtensionObject`] type, a container for any structured type
//! identified by the node id of its encoding.

use std::io::{Cursor, Read, Write};

use crate::{
    byte_string::ByteString,
    encoding::{
        read_u8, write_u8, BinaryDecodable, BinaryEncodable, EncodingResult, Error,
    },
    node_id::NodeId,
    node_ids::ObjectId,
    service_types::MessageInfo,
    string::XmlElement,
};

/// The body of an extension object.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum ExtensionObjectEncoding {
    /// No body.
    #[default]
    None,
    /// A body in UA-Binary encoding, held raw and decoded on demand.
    ByteString(ByteString),
    /// A body in XML encoding. Carried opaquely; this stack never produces
    /// or interprets XML bodies.
    XmlElement(XmlElement),
}

/// An extension object holds a structured type serialized inside an
/// envelope carrying the node id of the encoding that was used. The body is
/// kept as raw bytes and decoded against a concrete type on demand, which
/// works here because the set of structured types the server understands is
/// closed.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ExtensionObject {
    /// The node id of the encoding of the body, typically the
    /// `..._Encoding_DefaultBinary` object.
    pub node_id: NodeId,
    /// The body of the object.
    pub body: ExtensionObjectEncoding,
}

impl BinaryEncodable for ExtensionObject {
    fn byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        let mut size = self.node_id.byte_len(ctx) + 1;
        match &self.body {
            ExtensionObjectEncoding::None => {}
            ExtensionObjectEncoding::ByteString(value) => size += value.byte_len(ctx),
            ExtensionObjectEncoding::XmlElement(value) => size += value.byte_len(ctx),
        }
        size
    }

    fn encode<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        self.node_id.encode(stream, ctx)?;
        match &self.body {
            ExtensionObjectEncoding::None => write_u8(stream, 0x0),
            ExtensionObjectEncoding::ByteString(value) => {
                write_u8(stream, 0x1)?;
                value.encode(stream, ctx)
            }
            ExtensionObjectEncoding::XmlElement(value) => {
                write_u8(stream, 0x2)?;
                value.encode(stream, ctx)
            }
        }
    }
}

impl BinaryDecodable for ExtensionObject {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &crate::Context<'_>) -> EncodingResult<Self> {
        let node_id = NodeId::decode(stream, ctx)?;
        let encoding = read_u8(stream)?;
        let body = match encoding {
            0x0 => ExtensionObjectEncoding::None,
            0x1 => ExtensionObjectEncoding::ByteString(ByteString::decode(stream, ctx)?),
            0x2 => ExtensionObjectEncoding::XmlElement(XmlElement::decode(stream, ctx)?),
            r => {
                return Err(Error::decoding(format!(
                    "Invalid extension object encoding {r}"
                )));
            }
        };
        Ok(ExtensionObject { node_id, body })
    }
}

impl ExtensionObject {
    /// An extension object with no body.
    pub fn null() -> ExtensionObject {
        ExtensionObject::default()
    }

    /// `true` if the object has no body.
    pub fn is_null(&self) -> bool {
        matches!(self.body, ExtensionObjectEncoding::None)
    }

    /// The object id of the encoding, if the node id holds one.
    pub fn object_id(&self) -> Option<ObjectId> {
        self.node_id.as_object_id().ok()
    }

    /// Wrap `value` into an extension object by encoding it with its
    /// binary encoding id.
    pub fn from_message<T>(value: &T, ctx: &crate::Context<'_>) -> EncodingResult<ExtensionObject>
    where
        T: BinaryEncodable + MessageInfo,
    {
        let mut stream = Cursor::new(Vec::with_capacity(value.byte_len(ctx)));
        value.encode(&mut stream, ctx)?;
        Ok(ExtensionObject {
            node_id: value.type_id().into(),
            body: ExtensionObjectEncoding::ByteString(ByteString::from(stream.into_inner())),
        })
    }

    /// Decode the body against `T`. The caller is expected to have checked
    /// the node id against the encoding id of `T` first.
    pub fn decode_inner<T>(&self, ctx: &crate::Context<'_>) -> EncodingResult<T>
    where
        T: BinaryDecodable,
    {
        match &self.body {
            ExtensionObjectEncoding::ByteString(bytes) => {
                let mut stream = Cursor::new(bytes.as_ref());
                T::decode(&mut stream, ctx)
            }
            _ => Err(Error::decoding(
                "Extension object has no binary body to decode",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExtensionObject;
    use crate::{
        argument::Argument,
        context::ContextOwned,
        encoding::{BinaryDecodable, BinaryEncodable},
        node_ids::{DataTypeId, ObjectId},
    };

    #[test]
    fn wrap_and_unwrap() {
        let ctx_owned = ContextOwned::new_default();
        let ctx = ctx_owned.context();
        let value = Argument {
            name: "x".into(),
            data_type: DataTypeId::Int32.into(),
            value_rank: -1,
            array_dimensions: None,
            description: "arg".into(),
        };
        let wrapped = ExtensionObject::from_message(&value, &ctx).unwrap();
        assert_eq!(
            wrapped.object_id(),
            Some(ObjectId::Argument_Encoding_DefaultBinary)
        );
        let buf = wrapped.encode_to_vec(&ctx);
        assert_eq!(buf.len(), wrapped.byte_len(&ctx));
        let mut stream = buf.as_slice();
        let decoded = ExtensionObject::decode(&mut stream, &ctx).unwrap();
        let inner: Argument = decoded.decode_inner(&ctx).unwrap();
        assert_eq!(inner, value);
    }
}
