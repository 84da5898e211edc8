//! The [`ExpandedNodeId`] type, a node id extended with an optional
//! namespace URI and server index for cross server references.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use crate::{
    encoding::{
        process_encode_io_result, read_u32, read_u8, write_u32, BinaryDecodable, BinaryEncodable,
        EncodingResult, Error,
    },
    node_id::{Identifier, NodeId},
    status_code::StatusCode,
    string::UAString,
};

/// A NodeId that allows the namespace URI to be specified instead of the
/// namespace index, plus an index identifying the server holding the node.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct ExpandedNodeId {
    /// The inner node id.
    pub node_id: NodeId,
    /// Namespace URI. When set, it takes precedence over the node id's
    /// namespace index.
    pub namespace_uri: UAString,
    /// Index of the server holding the node, 0 for the local server.
    pub server_index: u32,
}

impl Default for ExpandedNodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        if !self.namespace_uri.is_null() {
            write!(f, "nsu={};{}", self.namespace_uri, self.node_id.identifier)
        } else {
            write!(f, "{}", self.node_id)
        }
    }
}

const NAMESPACE_URI_FLAG: u8 = 0x80;
const SERVER_INDEX_FLAG: u8 = 0x40;

impl BinaryEncodable for ExpandedNodeId {
    fn byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        let mut size = self.node_id.byte_len(ctx);
        if !self.namespace_uri.is_null() {
            size += self.namespace_uri.byte_len(ctx);
        }
        if self.server_index != 0 {
            size += 4;
        }
        size
    }

    fn encode<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        // The presence flags live in the high bits of the node id
        // discriminator byte.
        let mut buf = Vec::with_capacity(self.node_id.byte_len(ctx));
        self.node_id.encode(&mut buf, ctx)?;
        if !self.namespace_uri.is_null() {
            buf[0] |= NAMESPACE_URI_FLAG;
        }
        if self.server_index != 0 {
            buf[0] |= SERVER_INDEX_FLAG;
        }
        process_encode_io_result(stream.write_all(&buf))?;

        if !self.namespace_uri.is_null() {
            self.namespace_uri.encode(stream, ctx)?;
        }
        if self.server_index != 0 {
            write_u32(stream, self.server_index)?;
        }
        Ok(())
    }
}

impl BinaryDecodable for ExpandedNodeId {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &crate::Context<'_>) -> EncodingResult<Self> {
        let discriminator = read_u8(stream)?;
        let node_id = decode_node_id_body(stream, discriminator & 0x0f, ctx)?;

        let namespace_uri = if discriminator & NAMESPACE_URI_FLAG != 0 {
            UAString::decode(stream, ctx)?
        } else {
            UAString::null()
        };
        let server_index = if discriminator & SERVER_INDEX_FLAG != 0 {
            read_u32(stream)?
        } else {
            0
        };

        Ok(ExpandedNodeId {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}

fn decode_node_id_body<S: Read + ?Sized>(
    stream: &mut S,
    encoding: u8,
    ctx: &crate::Context<'_>,
) -> EncodingResult<NodeId> {
    use crate::byte_string::ByteString;
    use crate::encoding::read_u16;
    use crate::guid::Guid;

    Ok(match encoding {
        0x0 => NodeId::new(0, u32::from(read_u8(stream)?)),
        0x1 => {
            let namespace = read_u8(stream)?;
            let value = read_u16(stream)?;
            NodeId::new(u16::from(namespace), u32::from(value))
        }
        0x2 => {
            let namespace = read_u16(stream)?;
            let value = read_u32(stream)?;
            NodeId::new(namespace, value)
        }
        0x3 => {
            let namespace = read_u16(stream)?;
            NodeId::new(namespace, UAString::decode(stream, ctx)?)
        }
        0x4 => {
            let namespace = read_u16(stream)?;
            NodeId::new(namespace, Guid::decode(stream, ctx)?)
        }
        0x5 => {
            let namespace = read_u16(stream)?;
            NodeId::new(namespace, ByteString::decode(stream, ctx)?)
        }
        r => {
            return Err(Error::decoding(format!(
                "Unrecognized expanded node id type {r}"
            )));
        }
    })
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        ExpandedNodeId {
            node_id,
            namespace_uri: UAString::null(),
            server_index: 0,
        }
    }
}

impl From<&NodeId> for ExpandedNodeId {
    fn from(node_id: &NodeId) -> Self {
        Self::from(node_id.clone())
    }
}

impl FromStr for ExpandedNodeId {
    type Err = StatusCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the local form is parsed; a namespace URI in the string
        // cannot be resolved without a namespace table.
        NodeId::from_str(s).map(ExpandedNodeId::from)
    }
}

impl ExpandedNodeId {
    /// Create an expanded node id referencing a node in the local server.
    pub fn new(node_id: impl Into<NodeId>) -> ExpandedNodeId {
        ExpandedNodeId {
            node_id: node_id.into(),
            namespace_uri: UAString::null(),
            server_index: 0,
        }
    }

    /// The null expanded node id.
    pub fn null() -> ExpandedNodeId {
        Self::new(NodeId::null())
    }

    /// `true` if this is the null id.
    pub fn is_null(&self) -> bool {
        self.node_id.is_null() && self.namespace_uri.is_null() && self.server_index == 0
    }

    /// `true` if the target node lives in this server.
    pub fn is_local(&self) -> bool {
        self.server_index == 0
    }

    /// The inner numeric identifier, if there is one.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.node_id.identifier {
            Identifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExpandedNodeId;
    use crate::context::ContextOwned;
    use crate::encoding::{BinaryDecodable, BinaryEncodable};
    use crate::node_id::NodeId;
    use crate::string::UAString;

    fn round_trip(id: &ExpandedNodeId) {
        let ctx_owned = ContextOwned::new_default();
        let ctx = ctx_owned.context();
        let buf = id.encode_to_vec(&ctx);
        assert_eq!(buf.len(), id.byte_len(&ctx));
        let mut stream = buf.as_slice();
        assert_eq!(&ExpandedNodeId::decode(&mut stream, &ctx).unwrap(), id);
    }

    #[test]
    fn expanded_node_id_round_trip() {
        round_trip(&ExpandedNodeId::new(NodeId::new(1, "node")));
        round_trip(&ExpandedNodeId {
            node_id: NodeId::new(0, 2253u32),
            namespace_uri: UAString::from("urn:other:namespace"),
            server_index: 3,
        });
    }
}
