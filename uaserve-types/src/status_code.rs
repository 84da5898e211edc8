//! The [`StatusCode`] type, a 32-bit structured result code carrying a
//! severity and an OPC UA defined meaning.

use std::fmt;
use std::io::{Read, Write};

use crate::encoding::{
    read_u32, write_u32, DecodingOptions, EncodingResult, SimpleBinaryDecodable,
    SimpleBinaryEncodable,
};

/// A 32-bit OPC UA status code.
///
/// The top two bits carry the severity (good, uncertain, bad), the rest of
/// the upper half identifies the condition. Codes not defined by the
/// standard are representable, they just have no symbolic name.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StatusCode(u32);

macro_rules! status_codes {
    ($($name:ident = $value:literal, $doc:literal;)*) => {
        #[allow(non_upper_case_globals)]
        impl StatusCode {
            $(
                #[doc = $doc]
                pub const $name: StatusCode = StatusCode($value);
            )*

            /// The symbolic name of this status code, or `None` if the
            /// value does not match a code known to this stack.
            pub fn name(&self) -> Option<&'static str> {
                match self.0 {
                    $( $value => Some(stringify!($name)), )*
                    _ => None,
                }
            }
        }
    };
}

status_codes! {
    Good = 0x0000_0000, "The operation succeeded.";
    GoodSubscriptionTransferred = 0x002D_0000, "The subscription was transferred to another session.";
    GoodOverload = 0x002F_0000, "Sampling has slowed down due to resource limitations.";
    Uncertain = 0x4000_0000, "The operation result is uncertain.";
    Bad = 0x8000_0000, "The operation failed.";
    BadUnexpectedError = 0x8001_0000, "An unexpected error occurred.";
    BadInternalError = 0x8002_0000, "An internal error occurred as a result of a programming or configuration error.";
    BadOutOfMemory = 0x8003_0000, "Not enough memory to complete the operation.";
    BadResourceUnavailable = 0x8004_0000, "An operating system resource is not available.";
    BadCommunicationError = 0x8005_0000, "A low level communication error occurred.";
    BadEncodingError = 0x8006_0000, "Encoding halted because of invalid data in the objects being serialized.";
    BadDecodingError = 0x8007_0000, "Decoding halted because of invalid data in the stream.";
    BadEncodingLimitsExceeded = 0x8008_0000, "The message encoding/decoding limits imposed by the stack have been exceeded.";
    BadUnknownResponse = 0x8009_0000, "An unrecognized response was received from the server.";
    BadTimeout = 0x800A_0000, "The operation timed out.";
    BadServiceUnsupported = 0x800B_0000, "The server does not support the requested service.";
    BadShutdown = 0x800C_0000, "The operation was cancelled because the application is shutting down.";
    BadServerHalted = 0x800E_0000, "The server has stopped and cannot process any requests.";
    BadNothingToDo = 0x800F_0000, "No processing could be done because there was nothing to do.";
    BadTooManyOperations = 0x8010_0000, "The request could not be processed because it specified too many operations.";
    BadDataTypeIdUnknown = 0x8011_0000, "The extension object cannot be (de)serialized because the data type id is not recognized.";
    BadCertificateInvalid = 0x8012_0000, "The certificate provided as a parameter is not valid.";
    BadSecurityChecksFailed = 0x8013_0000, "An error occurred verifying security.";
    BadCertificateUntrusted = 0x801A_0000, "The certificate is not trusted.";
    BadUserAccessDenied = 0x801F_0000, "User does not have permission to perform the requested operation.";
    BadIdentityTokenInvalid = 0x8020_0000, "The user identity token is not valid.";
    BadIdentityTokenRejected = 0x8021_0000, "The user identity token is valid but the server has rejected it.";
    BadSecureChannelIdInvalid = 0x8022_0000, "The specified secure channel is no longer valid.";
    BadInvalidTimestamp = 0x8023_0000, "The timestamp is outside the range allowed by the server.";
    BadNonceInvalid = 0x8024_0000, "The nonce does appear to be not a random value or it is not the correct length.";
    BadSessionIdInvalid = 0x8025_0000, "The session id is not valid.";
    BadSessionClosed = 0x8026_0000, "The session was closed by the client.";
    BadSessionNotActivated = 0x8027_0000, "The session cannot be used because ActivateSession has not been called.";
    BadSubscriptionIdInvalid = 0x8028_0000, "The subscription id is not valid.";
    BadRequestHeaderInvalid = 0x802A_0000, "The header for the request is missing or invalid.";
    BadTimestampsToReturnInvalid = 0x802B_0000, "The timestamps to return parameter is invalid.";
    BadRequestCancelledByClient = 0x802C_0000, "The request was cancelled by the client.";
    BadNoCommunication = 0x8031_0000, "Communication with the data source is defined, but not established, and there is no last known value available.";
    BadWaitingForInitialData = 0x8032_0000, "Waiting for the server to obtain values from the underlying data source.";
    BadNodeIdInvalid = 0x8033_0000, "The syntax the node id is not valid.";
    BadNodeIdUnknown = 0x8034_0000, "The node id refers to a node that does not exist in the server address space.";
    BadAttributeIdInvalid = 0x8035_0000, "The attribute is not supported for the specified node.";
    BadIndexRangeInvalid = 0x8036_0000, "The syntax of the index range parameter is invalid.";
    BadIndexRangeNoData = 0x8037_0000, "No data exists within the range of indexes specified.";
    BadDataEncodingInvalid = 0x8038_0000, "The data encoding is invalid.";
    BadDataEncodingUnsupported = 0x8039_0000, "The server does not support the requested data encoding for the node.";
    BadNotReadable = 0x803A_0000, "The access level does not allow reading or subscribing to the node.";
    BadNotWritable = 0x803B_0000, "The access level does not allow writing to the node.";
    BadOutOfRange = 0x803C_0000, "The value was out of range.";
    BadNotSupported = 0x803D_0000, "The requested operation is not supported.";
    BadNotFound = 0x803E_0000, "A requested item was not found or a search operation ended without success.";
    BadNotImplemented = 0x8040_0000, "Requested operation is not implemented.";
    BadMonitoringModeInvalid = 0x8041_0000, "The monitoring mode is invalid.";
    BadMonitoredItemIdInvalid = 0x8042_0000, "The monitoring item id does not refer to a valid monitored item.";
    BadMonitoredItemFilterInvalid = 0x8043_0000, "The monitored item filter parameter is not valid.";
    BadMonitoredItemFilterUnsupported = 0x8044_0000, "The server does not support the requested monitored item filter.";
    BadFilterNotAllowed = 0x8045_0000, "A monitoring filter cannot be used in combination with the attribute specified.";
    BadEventFilterInvalid = 0x8047_0000, "The event filter is not valid.";
    BadContinuationPointInvalid = 0x804A_0000, "The continuation point provided is no longer valid.";
    BadNoContinuationPoints = 0x804B_0000, "The operation could not be processed because all continuation points have been allocated.";
    BadReferenceTypeIdInvalid = 0x804C_0000, "The reference type id does not refer to a valid reference type node.";
    BadBrowseDirectionInvalid = 0x804D_0000, "The browse direction is not valid.";
    BadNodeNotInView = 0x804E_0000, "The node is not part of the view.";
    BadSecurityModeRejected = 0x8054_0000, "The security mode does not meet the requirements set by the server.";
    BadSecurityPolicyRejected = 0x8055_0000, "The security policy does not meet the requirements set by the server.";
    BadTooManySessions = 0x8056_0000, "The server has reached its maximum number of sessions.";
    BadParentNodeIdInvalid = 0x805C_0000, "The parent node id does not to refer to a valid node.";
    BadReferenceNotAllowed = 0x805D_0000, "The reference could not be created because it violates constraints imposed by the data model.";
    BadNodeIdRejected = 0x805E_0000, "The requested node id was rejected because it was either invalid or server does not allow node ids to be specified by the client.";
    BadNodeIdExists = 0x805F_0000, "The requested node id is already used by another node.";
    BadNodeClassInvalid = 0x8060_0000, "The node class is not valid.";
    BadBrowseNameInvalid = 0x8061_0000, "The browse name is invalid.";
    BadBrowseNameDuplicated = 0x8062_0000, "The browse name is not unique among nodes that share the same relationship with the parent.";
    BadNodeAttributesInvalid = 0x8063_0000, "The node attributes are not valid for the node class.";
    BadTypeDefinitionInvalid = 0x8064_0000, "The type definition node id does not reference an appropriate type node.";
    BadSourceNodeIdInvalid = 0x8065_0000, "The source node id does not reference a valid node.";
    BadTargetNodeIdInvalid = 0x8066_0000, "The target node id does not reference a valid node.";
    BadDuplicateReferenceNotAllowed = 0x8067_0000, "The reference type between the nodes is already defined.";
    BadInvalidSelfReference = 0x8068_0000, "The server does not allow this type of self reference on this node.";
    BadNoDeleteRights = 0x806A_0000, "The server will not allow the node to be deleted.";
    BadViewIdUnknown = 0x806C_0000, "The view id does not refer to a valid view node.";
    BadNoMatch = 0x806F_0000, "The requested operation has no match to return.";
    BadMaxAgeInvalid = 0x8070_0000, "The max age parameter is invalid.";
    BadHistoryOperationUnsupported = 0x8072_0000, "The server does not support the requested operation.";
    BadWriteNotSupported = 0x8073_0000, "The server does not support writing the combination of value, status and timestamps provided.";
    BadTypeMismatch = 0x8074_0000, "The value supplied for the attribute is not of the same type as the attribute's value.";
    BadMethodInvalid = 0x8075_0000, "The method id does not refer to a method for the specified object.";
    BadArgumentsMissing = 0x8076_0000, "The client did not specify all of the input arguments for the method.";
    BadTooManySubscriptions = 0x8077_0000, "The server has reached its maximum number of subscriptions.";
    BadTooManyPublishRequests = 0x8078_0000, "The server has reached the maximum number of queued publish requests.";
    BadNoSubscription = 0x8079_0000, "There is no subscription available for this session.";
    BadSequenceNumberUnknown = 0x807A_0000, "The sequence number is unknown to the server.";
    BadMessageNotAvailable = 0x807B_0000, "The requested notification message is no longer available.";
    BadTcpServerTooBusy = 0x807D_0000, "The server cannot process the request because it is too busy.";
    BadTcpMessageTypeInvalid = 0x807E_0000, "The type of the message specified in the header invalid.";
    BadStateNotActive = 0x807F_0000, "The sub-state machine is not currently active.";
    BadTcpSecureChannelUnknown = 0x8085_0000, "The secure channel id and/or token id are not currently in use.";
    BadTcpMessageTooLarge = 0x8086_0000, "The size of the message chunk specified in the header is too large.";
    BadTcpNotEnoughResources = 0x8087_0000, "There are not enough resources to process the request.";
    BadTcpInternalError = 0x8088_0000, "An internal error occurred.";
    BadTcpEndpointUrlInvalid = 0x8089_0000, "The server does not recognize the endpoint url.";
    BadRequestInterrupted = 0x808A_0000, "The request could not be sent because of a network interruption.";
    BadRequestTimeout = 0x808B_0000, "Timeout occurred while processing the request.";
    BadSecureChannelClosed = 0x808C_0000, "The secure channel has been closed.";
    BadSecureChannelTokenUnknown = 0x808D_0000, "The token has expired or is not recognized.";
    BadSequenceNumberInvalid = 0x808E_0000, "The sequence number is not valid.";
    BadInvalidArgument = 0x80AB_0000, "One or more arguments are invalid.";
    BadConnectionRejected = 0x80AC_0000, "Could not establish a network connection to remote server.";
    BadDisconnect = 0x80AD_0000, "The server has disconnected from the client.";
    BadConnectionClosed = 0x80AE_0000, "The network connection has been closed.";
    BadInvalidState = 0x80AF_0000, "The operation cannot be completed because the object is closed, uninitialized or in some other invalid state.";
    BadEndOfStream = 0x80B0_0000, "Cannot move beyond end of the stream.";
    BadMaxConnectionsReached = 0x80B7_0000, "The operation could not be finished because all available connections are in use.";
    BadRequestTooLarge = 0x80B8_0000, "The request message size exceeds limits set by the server.";
    BadResponseTooLarge = 0x80B9_0000, "The response message size exceeds limits set by the client.";
    BadProtocolVersionUnsupported = 0x80BE_0000, "The applications do not have compatible protocol versions.";
    BadTooManyMonitoredItems = 0x80DB_0000, "The request could not be processed because there are too many monitored items in the subscription.";
}

impl StatusCode {
    /// The raw 32-bit value of the status code.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// `true` if the severity is good.
    pub fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// `true` if the severity is uncertain.
    pub fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// `true` if the severity is bad.
    pub fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        StatusCode(value)
    }
}

impl From<StatusCode> for u32 {
    fn from(value: StatusCode) -> Self {
        value.0
    }
}

impl From<StatusCode> for std::io::Error {
    fn from(value: StatusCode) -> Self {
        std::io::Error::other(format!("StatusCode {}", value))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "StatusCode({:#010X})", self.0),
        }
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for StatusCode {}

impl SimpleBinaryEncodable for StatusCode {
    fn byte_len(&self) -> usize {
        4
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        write_u32(stream, self.0)
    }
}

impl SimpleBinaryDecodable for StatusCode {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(StatusCode(read_u32(stream)?))
    }
}

#[cfg(test)]
mod tests {
    use super::StatusCode;

    #[test]
    fn severity() {
        assert!(StatusCode::Good.is_good());
        assert!(!StatusCode::Good.is_bad());
        assert!(StatusCode::BadTypeMismatch.is_bad());
        assert!(!StatusCode::BadTypeMismatch.is_good());
        assert!(StatusCode::Uncertain.is_uncertain());
        assert!(!StatusCode::Uncertain.is_bad());
    }

    #[test]
    fn names() {
        assert_eq!(StatusCode::Good.name(), Some("Good"));
        assert_eq!(
            StatusCode::BadSessionIdInvalid.to_string(),
            "BadSessionIdInvalid"
        );
        assert_eq!(
            StatusCode::from(0xDEAD_0000u32).to_string(),
            "StatusCode(0xDEAD0000)"
        );
    }
}
