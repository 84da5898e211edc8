//! The [`NodeId`] type, identity of a node in the address space.

use std::{
    self,
    cmp::Ordering,
    fmt,
    io::{Read, Write},
    str::FromStr,
    sync::{
        atomic::{AtomicU32, Ordering as AtomicOrdering},
        LazyLock,
    },
};

use crate::{
    byte_string::ByteString,
    encoding::{BinaryDecodable, BinaryEncodable, EncodingResult, Error},
    guid::Guid,
    node_ids::{DataTypeId, ObjectId, ObjectTypeId, ReferenceTypeId, VariableTypeId},
    read_u16, read_u32, read_u8,
    status_code::StatusCode,
    string::UAString,
    write_u16, write_u32, write_u8,
};

/// The kind of identifier: numeric, string, guid or bytestring.
#[derive(Eq, PartialEq, Clone, Debug, Hash, PartialOrd, Ord)]
pub enum Identifier {
    /// Numeric identifier, `i=123`.
    Numeric(u32),
    /// String identifier, `s=...`.
    String(UAString),
    /// GUID identifier, `g=...`.
    Guid(Guid),
    /// Opaque identifier, `b=...`.
    ByteString(ByteString),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", *v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={:?}", v),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

impl FromStr for Identifier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 2 {
            return Err(());
        }
        let k = &s[..2];
        let v = &s[2..];
        match k {
            "i=" => v.parse::<u32>().map(|v| v.into()).map_err(|_| ()),
            "s=" => Ok(UAString::from(v).into()),
            "g=" => Guid::from_str(v).map(|v| v.into()).map_err(|_| ()),
            "b=" => ByteString::from_base64(v).map(|v| v.into()).ok_or(()),
            _ => Err(()),
        }
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl From<i32> for Identifier {
    fn from(v: i32) -> Self {
        Identifier::Numeric(v as u32)
    }
}

impl<'a> From<&'a str> for Identifier {
    fn from(v: &'a str) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::from(UAString::from(v))
    }
}

impl From<UAString> for Identifier {
    fn from(v: UAString) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<ByteString> for Identifier {
    fn from(v: ByteString) -> Self {
        Identifier::ByteString(v)
    }
}

impl Identifier {
    // Rank used by the total order: identifier kind first.
    fn rank(&self) -> u8 {
        match self {
            Identifier::Numeric(_) => 0,
            Identifier::String(_) => 1,
            Identifier::Guid(_) => 2,
            Identifier::ByteString(_) => 3,
        }
    }
}

/// Error returned from working with node IDs.
#[derive(Debug)]
pub struct NodeIdError;

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIdError")
    }
}

impl std::error::Error for NodeIdError {}

/// An identifier for a node in the address space of an OPC UA server.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct NodeId {
    /// The index of the namespace holding the node.
    pub namespace: u16,
    /// The identifier of the node within the namespace.
    pub identifier: Identifier,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

// Total order: identifier kind, then namespace, then identifier content.
impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.identifier.rank(), self.namespace)
            .cmp(&(other.identifier.rank(), other.namespace))
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl BinaryEncodable for NodeId {
    fn byte_len(&self, ctx: &crate::Context<'_>) -> usize {
        // The discriminator byte selects among increasingly large layouts.
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    2
                } else if self.namespace <= 255 && *value <= 65535 {
                    4
                } else {
                    7
                }
            }
            Identifier::String(value) => 3 + value.byte_len(ctx),
            Identifier::Guid(value) => 3 + value.byte_len(ctx),
            Identifier::ByteString(value) => 3 + value.byte_len(ctx),
        }
    }

    fn encode<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &crate::Context<'_>,
    ) -> EncodingResult<()> {
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    // Two byte encoding
                    write_u8(stream, 0x0)?;
                    write_u8(stream, *value as u8)
                } else if self.namespace <= 255 && *value <= 65535 {
                    // Four byte encoding
                    write_u8(stream, 0x1)?;
                    write_u8(stream, self.namespace as u8)?;
                    write_u16(stream, *value as u16)
                } else {
                    // Full numeric encoding
                    write_u8(stream, 0x2)?;
                    write_u16(stream, self.namespace)?;
                    write_u32(stream, *value)
                }
            }
            Identifier::String(value) => {
                write_u8(stream, 0x3)?;
                write_u16(stream, self.namespace)?;
                value.encode(stream, ctx)
            }
            Identifier::Guid(value) => {
                write_u8(stream, 0x4)?;
                write_u16(stream, self.namespace)?;
                value.encode(stream, ctx)
            }
            Identifier::ByteString(value) => {
                write_u8(stream, 0x5)?;
                write_u16(stream, self.namespace)?;
                value.encode(stream, ctx)
            }
        }
    }
}

impl BinaryDecodable for NodeId {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &crate::Context<'_>) -> EncodingResult<Self> {
        let discriminator = read_u8(stream)?;
        let node_id = match discriminator {
            0x0 => {
                let value = read_u8(stream)?;
                NodeId::new(0, u32::from(value))
            }
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
                let value = UAString::decode(stream, ctx)?;
                NodeId::new(namespace, value)
            }
            0x4 => {
                let namespace = read_u16(stream)?;
                let value = Guid::decode(stream, ctx)?;
                NodeId::new(namespace, value)
            }
            0x5 => {
                let namespace = read_u16(stream)?;
                let value = ByteString::decode(stream, ctx)?;
                NodeId::new(namespace, value)
            }
            _ => {
                return Err(Error::decoding(format!(
                    "Unrecognized node id type {}",
                    discriminator
                )));
            }
        };
        Ok(node_id)
    }
}

impl FromStr for NodeId {
    type Err = StatusCode;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use regex::Regex;

        // ns=<namespaceindex>;<type>=<value> where the ns= part is omitted
        // for namespace 0, per part 6 5.3.1.10.
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^(ns=(?P<ns>[0-9]+);)?(?P<t>[isgb]=.+)$").unwrap());

        let captures = RE.captures(s).ok_or(StatusCode::BadNodeIdInvalid)?;

        let namespace = if let Some(ns) = captures.name("ns") {
            ns.as_str()
                .parse::<u16>()
                .map_err(|_| StatusCode::BadNodeIdInvalid)?
        } else {
            0
        };

        let t = captures.name("t").unwrap();
        Identifier::from_str(t.as_str())
            .map(|t| NodeId::new(namespace, t))
            .map_err(|_| StatusCode::BadNodeIdInvalid)
    }
}

impl From<&NodeId> for NodeId {
    fn from(v: &NodeId) -> Self {
        v.clone()
    }
}

impl<'a> From<(u16, &'a str)> for NodeId {
    fn from(v: (u16, &'a str)) -> Self {
        Self::new(v.0, UAString::from(v.1))
    }
}

impl From<(u16, u32)> for NodeId {
    fn from(v: (u16, u32)) -> Self {
        Self::new(v.0, v.1)
    }
}

impl From<(u16, Guid)> for NodeId {
    fn from(v: (u16, Guid)) -> Self {
        Self::new(v.0, v.1)
    }
}

// Cheap comparisons for comparing node IDs to constants.
impl PartialEq<(u16, &str)> for NodeId {
    fn eq(&self, other: &(u16, &str)) -> bool {
        self.namespace == other.0
            && match &self.identifier {
                Identifier::String(s) => s.as_ref() == other.1,
                _ => false,
            }
    }
}

impl PartialEq<(u16, u32)> for NodeId {
    fn eq(&self, other: &(u16, u32)) -> bool {
        self.namespace == other.0
            && match &self.identifier {
                Identifier::Numeric(s) => s == &other.1,
                _ => false,
            }
    }
}

macro_rules! eq_typed_id {
    ($t:ident) => {
        impl PartialEq<$t> for NodeId {
            fn eq(&self, other: &$t) -> bool {
                *self == (0u16, *other as u32)
            }
        }
    };
}

eq_typed_id!(ObjectId);
eq_typed_id!(ObjectTypeId);
eq_typed_id!(ReferenceTypeId);
eq_typed_id!(VariableTypeId);
eq_typed_id!(DataTypeId);

static NEXT_NODE_ID_NUMERIC: AtomicU32 = AtomicU32::new(1000);

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl NodeId {
    /// Constructs a new NodeId from anything that can be turned into an
    /// [`Identifier`]: u32, Guid, ByteString, UAString or string slices.
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: 'static + Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// The node id of the root folder.
    pub fn root_folder_id() -> NodeId {
        ObjectId::RootFolder.into()
    }

    /// The node id of the objects folder.
    pub fn objects_folder_id() -> NodeId {
        ObjectId::ObjectsFolder.into()
    }

    /// Test if the node id is null, i.e. namespace 0 and numeric id 0.
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// The null node id.
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    /// Create a numeric node id with a process-wide incrementing value.
    pub fn next_numeric(namespace: u16) -> NodeId {
        NodeId::new(
            namespace,
            NEXT_NODE_ID_NUMERIC.fetch_add(1, AtomicOrdering::SeqCst),
        )
    }

    /// Extract an [`ObjectId`], providing the node id holds one.
    pub fn as_object_id(&self) -> std::result::Result<ObjectId, NodeIdError> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                ObjectId::try_from(id).map_err(|_| NodeIdError)
            }
            _ => Err(NodeIdError),
        }
    }

    /// Extract a [`ReferenceTypeId`], providing the node id holds one.
    pub fn as_reference_type_id(&self) -> std::result::Result<ReferenceTypeId, NodeIdError> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                ReferenceTypeId::try_from(id).map_err(|_| NodeIdError)
            }
            _ => Err(NodeIdError),
        }
    }

    /// Extract a [`DataTypeId`], providing the node id holds one.
    pub fn as_data_type_id(&self) -> std::result::Result<DataTypeId, NodeIdError> {
        match self.identifier {
            Identifier::Numeric(id) if self.namespace == 0 => {
                DataTypeId::try_from(id).map_err(|_| NodeIdError)
            }
            _ => Err(NodeIdError),
        }
    }

    /// Test if the node id is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self.identifier, Identifier::Numeric(_))
    }

    /// The numeric value of this node id, if it is numeric.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.identifier {
            Identifier::Numeric(i) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Identifier, NodeId};
    use crate::context::ContextOwned;
    use crate::encoding::{BinaryDecodable, BinaryEncodable};
    use std::str::FromStr;

    fn round_trip(id: &NodeId) {
        let ctx_owned = ContextOwned::new_default();
        let ctx = ctx_owned.context();
        let buf = id.encode_to_vec(&ctx);
        assert_eq!(buf.len(), id.byte_len(&ctx));
        let mut stream = buf.as_slice();
        assert_eq!(&NodeId::decode(&mut stream, &ctx).unwrap(), id);
    }

    #[test]
    fn node_id_encodings() {
        // Two byte
        round_trip(&NodeId::new(0, 255u32));
        // Four byte
        round_trip(&NodeId::new(2, 1025u32));
        // Full numeric
        round_trip(&NodeId::new(300, 1_000_000u32));
        // String, guid, bytestring
        round_trip(&NodeId::new(1, "the.answer"));
        round_trip(&NodeId::new(1, crate::Guid::new()));
        round_trip(&NodeId::new(1, crate::ByteString::from(vec![1u8, 2, 3])));
    }

    #[test]
    fn parse() {
        assert_eq!(
            NodeId::from_str("i=2255").unwrap(),
            NodeId::new(0, 2255u32)
        );
        assert_eq!(
            NodeId::from_str("ns=1;s=the.answer").unwrap(),
            NodeId::new(1, "the.answer")
        );
        assert!(NodeId::from_str("nonsense").is_err());
    }

    #[test]
    fn total_order_is_type_first() {
        let numeric = NodeId::new(5, 10u32);
        let string = NodeId::new(0, "aaa");
        // A numeric id sorts before any string id regardless of namespace.
        assert!(numeric < string);
        assert_eq!(
            numeric.identifier,
            Identifier::Numeric(10),
        );
    }
}
