//! The [`SecureChannel`] type: per-connection channel state covering token
//! ids and rollover, nonces, sequence numbers and the security capability.

use std::sync::Arc;

use uaserve_types::{
    status_code::StatusCode, ByteString, ContextOwned, DecodingOptions, EncodingResult, Error,
    MessageSecurityMode, NamespaceMap,
};

use super::{
    message_chunk::{MessageChunk, MessageChunkType},
    security_header::{AsymmetricSecurityHeader, SecurityHeader, SymmetricSecurityHeader},
    security_policy::{CryptoProvider, NoSecurity, SecurityPolicy},
};

/// Whether this side of the channel is the client or the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// This side opened the channel.
    Client,
    /// This side accepted the channel.
    Server,
}

/// State of one secure channel. One per connection; the server-wide
/// bookkeeping of all channels lives in the channel manager of the server
/// crate.
pub struct SecureChannel {
    role: Role,
    security_policy: SecurityPolicy,
    security_mode: MessageSecurityMode,
    crypto: Arc<dyn CryptoProvider>,
    secure_channel_id: u32,
    /// The active token id, 0 before the first OPN completes.
    token_id: u32,
    /// A renewed token that the remote has not used yet. Becomes the
    /// active token when first referenced by an incoming message.
    next_token_id: Option<u32>,
    /// The previously active token, accepted during the overlap after a
    /// renewal.
    prev_token_id: Option<u32>,
    local_nonce: Vec<u8>,
    remote_nonce: Vec<u8>,
    send_sequence_number: u32,
    context: ContextOwned,
}

impl SecureChannel {
    /// Create an unsecured channel for the given role.
    pub fn new(role: Role, decoding_options: DecodingOptions) -> SecureChannel {
        Self::new_with_crypto(role, decoding_options, Arc::new(NoSecurity))
    }

    /// Create a channel with a specific crypto provider.
    pub fn new_with_crypto(
        role: Role,
        decoding_options: DecodingOptions,
        crypto: Arc<dyn CryptoProvider>,
    ) -> SecureChannel {
        SecureChannel {
            role,
            security_policy: SecurityPolicy::None,
            security_mode: MessageSecurityMode::None,
            crypto,
            secure_channel_id: 0,
            token_id: 0,
            next_token_id: None,
            prev_token_id: None,
            local_nonce: Vec::new(),
            remote_nonce: Vec::new(),
            send_sequence_number: 0,
            context: ContextOwned::new(NamespaceMap::new(), decoding_options),
        }
    }

    /// `true` if this is the client side of the channel.
    pub fn is_client_role(&self) -> bool {
        self.role == Role::Client
    }

    /// The channel id, 0 before the channel is opened.
    pub fn secure_channel_id(&self) -> u32 {
        self.secure_channel_id
    }

    /// Set the channel id.
    pub fn set_secure_channel_id(&mut self, id: u32) {
        self.secure_channel_id = id;
    }

    /// The active token id.
    pub fn token_id(&self) -> u32 {
        self.token_id
    }

    /// The security policy of the channel.
    pub fn security_policy(&self) -> SecurityPolicy {
        self.security_policy
    }

    /// Set the security policy.
    pub fn set_security_policy(&mut self, policy: SecurityPolicy) {
        self.security_policy = policy;
    }

    /// The message security mode of the channel.
    pub fn security_mode(&self) -> MessageSecurityMode {
        self.security_mode
    }

    /// Set the message security mode.
    pub fn set_security_mode(&mut self, mode: MessageSecurityMode) {
        self.security_mode = mode;
    }

    /// The encoding context of the channel.
    pub fn context(&self) -> &ContextOwned {
        &self.context
    }

    /// The encoding context, mutable.
    pub fn context_mut(&mut self) -> &mut ContextOwned {
        &mut self.context
    }

    /// Replace the namespace table of the encoding context.
    pub fn set_namespaces(&mut self, namespaces: NamespaceMap) {
        *self.context.namespaces_mut() = namespaces;
    }

    /// The decoding options of the channel.
    pub fn decoding_options(&self) -> DecodingOptions {
        self.context.options().clone()
    }

    /// Install a freshly issued token. The first token becomes active
    /// immediately; a renewal is staged until the remote first uses it.
    pub fn issue_token(&mut self, token_id: u32) {
        if self.token_id == 0 {
            self.token_id = token_id;
        } else {
            self.next_token_id = Some(token_id);
        }
    }

    /// Check the token id of an incoming symmetric chunk, performing the
    /// rollover when the remote first uses a renewed token.
    pub fn verify_token_id(&mut self, token_id: u32) -> EncodingResult<()> {
        if token_id == self.token_id {
            return Ok(());
        }
        if self.next_token_id == Some(token_id) {
            // The remote started using the renewed token; revolve.
            self.prev_token_id = Some(self.token_id);
            self.token_id = token_id;
            self.next_token_id = None;
            return Ok(());
        }
        if self.prev_token_id == Some(token_id) {
            // Old token within the overlap period.
            return Ok(());
        }
        Err(Error::new(
            StatusCode::BadSecureChannelTokenUnknown,
            format!(
                "Token id {} is not the active ({}) or staged token of channel {}",
                token_id, self.token_id, self.secure_channel_id
            ),
        ))
    }

    /// Generate and store a fresh local nonce of the policy length.
    pub fn create_local_nonce(&mut self) {
        self.local_nonce = self
            .crypto
            .generate_nonce(self.security_policy.nonce_length());
    }

    /// The local nonce as a byte string for the OPN response.
    pub fn local_nonce_as_byte_string(&self) -> ByteString {
        if self.local_nonce.is_empty() {
            ByteString::null()
        } else {
            ByteString::from(&self.local_nonce)
        }
    }

    /// Store the nonce received from the remote and derive keys when the
    /// channel is secured.
    pub fn set_remote_nonce(&mut self, nonce: &ByteString) -> EncodingResult<()> {
        self.remote_nonce = nonce.as_ref().to_vec();
        if self.security_mode != MessageSecurityMode::None {
            let (client_nonce, server_nonce) = if self.is_client_role() {
                (self.local_nonce.as_slice(), self.remote_nonce.as_slice())
            } else {
                (self.remote_nonce.as_slice(), self.local_nonce.as_slice())
            };
            self.crypto.derive_keys(client_nonce, server_nonce)?;
        }
        Ok(())
    }

    /// The next sequence number for an outgoing chunk. Wraps to 1 after
    /// `u32::MAX - 1`.
    pub fn next_send_sequence_number(&mut self) -> u32 {
        if self.send_sequence_number >= u32::MAX - 1 {
            self.send_sequence_number = 1;
        } else {
            self.send_sequence_number += 1;
        }
        self.send_sequence_number
    }

    /// Build the security header for an outgoing chunk of the given type.
    pub fn make_security_header(&self, message_type: MessageChunkType) -> SecurityHeader {
        match message_type {
            MessageChunkType::OpenSecureChannel => {
                // Certificates would go here for secured channels.
                SecurityHeader::Asymmetric(AsymmetricSecurityHeader::none())
            }
            _ => SecurityHeader::Symmetric(SymmetricSecurityHeader {
                token_id: self.token_id,
            }),
        }
    }

    /// Size in bytes of the signature that would follow a body secured
    /// with `security_header`.
    pub fn signature_size(&self, _security_header: &SecurityHeader) -> usize {
        if self.security_mode == MessageSecurityMode::None {
            0
        } else {
            self.crypto.signature_size()
        }
    }

    /// The plain text block size and minimum padding for encrypted chunks,
    /// both zero when not encrypting.
    pub fn padding_block_sizes(&self) -> (usize, usize) {
        if self.security_mode == MessageSecurityMode::SignAndEncrypt {
            (
                self.crypto.plain_text_block_size(),
                self.crypto.min_padding(),
            )
        } else {
            (0, 0)
        }
    }

    /// Verify and strip the security of an incoming chunk, returning the
    /// verified chunk. For symmetric chunks this checks the token id and
    /// performs token rollover.
    pub fn verify_and_remove_security(&mut self, data: &[u8]) -> EncodingResult<MessageChunk> {
        let decoding_options = self.decoding_options();
        let chunk = MessageChunk {
            data: data.to_vec(),
        };
        let header = chunk.message_header(&decoding_options)?;

        if !header.message_type.is_open_secure_channel() {
            let mut stream = std::io::Cursor::new(&chunk.data);
            use uaserve_types::SimpleBinaryDecodable;
            let _ = super::message_chunk::MessageChunkHeader::decode(
                &mut stream,
                &decoding_options,
            )?;
            let security_header = SymmetricSecurityHeader::decode(&mut stream, &decoding_options)?;
            // Token id 0 appears before the first OPN response has been
            // processed by the remote; only verify on opened channels.
            if self.token_id != 0 {
                self.verify_token_id(security_header.token_id)?;
            }

            if self.security_mode != MessageSecurityMode::None {
                // A secured channel would verify the signature and decrypt
                // the body through the crypto provider here.
                self.crypto.sym_verify(&chunk.data, &[])?;
            }
        }

        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, SecureChannel};
    use uaserve_types::{DecodingOptions, StatusCode};

    #[test]
    fn sequence_number_wraps() {
        let mut channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        assert_eq!(channel.next_send_sequence_number(), 1);
        assert_eq!(channel.next_send_sequence_number(), 2);
        channel.send_sequence_number = u32::MAX - 1;
        assert_eq!(channel.next_send_sequence_number(), 1);
    }

    #[test]
    fn deterministic_nonce_provider() {
        use crate::comms::security_policy::DeterministicCrypto;
        use std::sync::Arc;

        let mut channel = SecureChannel::new_with_crypto(
            Role::Server,
            DecodingOptions::default(),
            Arc::new(DeterministicCrypto),
        );
        channel.create_local_nonce();
        let nonce = channel.local_nonce_as_byte_string();
        assert_eq!(nonce.as_ref().len(), 32);
        assert_eq!(&nonce.as_ref()[..4], &[0, 1, 2, 3]);
    }

    #[test]
    fn token_rollover() {
        let mut channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        channel.issue_token(1);
        assert_eq!(channel.token_id(), 1);
        assert!(channel.verify_token_id(1).is_ok());

        // Renewal stages the next token, both are accepted.
        channel.issue_token(2);
        assert_eq!(channel.token_id(), 1);
        assert!(channel.verify_token_id(1).is_ok());

        // First use of the new token revolves it.
        assert!(channel.verify_token_id(2).is_ok());
        assert_eq!(channel.token_id(), 2);
        // Old token remains accepted during the overlap.
        assert!(channel.verify_token_id(1).is_ok());

        // A token never issued is rejected.
        assert_eq!(
            channel.verify_token_id(9).unwrap_err().status(),
            StatusCode::BadSecureChannelTokenUnknown
        );
    }
}
