//! Simple enumerations shared by the service sets.

#[allow(unused)]
mod uaserve {
    pub use crate as types;
}

/// How messages on a secure channel are secured.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum MessageSecurityMode {
    /// Invalid security mode.
    #[uaserve(default)]
    Invalid = 0,
    /// No security applied.
    None = 1,
    /// Messages are signed.
    Sign = 2,
    /// Messages are signed and encrypted.
    SignAndEncrypt = 3,
}

/// The kind of user identity token accepted by an endpoint.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum UserTokenType {
    /// Anonymous access, no token.
    #[uaserve(default)]
    Anonymous = 0,
    /// User name and password.
    UserName = 1,
    /// X509 certificate.
    Certificate = 2,
    /// Token issued by an external authorization service.
    IssuedToken = 3,
}

/// The kind of OPC UA application.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum ApplicationType {
    /// A server.
    #[uaserve(default)]
    Server = 0,
    /// A client.
    Client = 1,
    /// Both client and server.
    ClientAndServer = 2,
    /// A discovery server.
    DiscoveryServer = 3,
}

/// Whether an OpenSecureChannel request creates or renews a channel.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum SecurityTokenRequestType {
    /// Create a new secure channel.
    #[uaserve(default)]
    Issue = 0,
    /// Renew the token of an existing channel.
    Renew = 1,
}

/// Which timestamps a service should return with values.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum TimestampsToReturn {
    /// Only the source timestamp.
    Source = 0,
    /// Only the server timestamp.
    Server = 1,
    /// Both timestamps.
    #[uaserve(default)]
    Both = 2,
    /// No timestamps.
    Neither = 3,
    /// Invalid, only valid in certain requests.
    Invalid = 4,
}

/// The class of a node.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum NodeClass {
    /// No class specified, used as a browse filter wildcard.
    #[uaserve(default)]
    Unspecified = 0,
    /// An object.
    Object = 1,
    /// A variable with a value.
    Variable = 2,
    /// A callable method.
    Method = 4,
    /// An object type.
    ObjectType = 8,
    /// A variable type.
    VariableType = 16,
    /// A reference type.
    ReferenceType = 32,
    /// A data type.
    DataType = 64,
    /// A view over the address space.
    View = 128,
}

/// The direction of references to follow when browsing.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum BrowseDirection {
    /// Follow references from source to target.
    #[uaserve(default)]
    Forward = 0,
    /// Follow references from target to source.
    Inverse = 1,
    /// Follow references in both directions.
    Both = 2,
    /// Invalid direction.
    Invalid = 3,
}

/// The monitoring mode of a monitored item.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum MonitoringMode {
    /// The item is not sampled.
    Disabled = 0,
    /// The item is sampled, but notifications are not reported.
    Sampling = 1,
    /// The item is sampled and notifications are reported.
    #[uaserve(default)]
    Reporting = 2,
}

/// Which parts of a data value trigger a data change notification.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum DataChangeTrigger {
    /// Only status changes trigger.
    Status = 0,
    /// Status or value changes trigger.
    #[uaserve(default)]
    StatusValue = 1,
    /// Status, value or source timestamp changes trigger.
    StatusValueTimestamp = 2,
}

/// The kind of deadband applied by a data change filter.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum DeadbandType {
    /// No deadband.
    #[uaserve(default)]
    None = 0,
    /// Absolute deadband.
    Absolute = 1,
    /// Percent deadband relative to an EURange. Not supported by this
    /// server.
    Percent = 2,
}

/// Operators usable in event where clauses.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum FilterOperator {
    #[uaserve(default)]
    Equals = 0,
    IsNull = 1,
    GreaterThan = 2,
    LessThan = 3,
    GreaterThanOrEqual = 4,
    LessThanOrEqual = 5,
    Like = 6,
    Not = 7,
    Between = 8,
    InList = 9,
    And = 10,
    Or = 11,
    Cast = 12,
    InView = 13,
    OfType = 14,
    RelatedTo = 15,
    BitwiseAnd = 16,
    BitwiseOr = 17,
}

/// The running state of the server.
#[uaserve::types::ua_encodable]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i32)]
pub enum ServerState {
    /// The server is running normally.
    Running = 0,
    /// The server has failed.
    Failed = 1,
    /// The server has no configuration.
    NoConfiguration = 2,
    /// The server is suspended.
    Suspended = 3,
    /// The server is shutting down.
    #[uaserve(default)]
    Shutdown = 4,
    /// The server is in test mode.
    Test = 5,
    /// The server is in communication fault state.
    CommunicationFault = 6,
    /// The server state is unknown.
    Unknown = 7,
}
