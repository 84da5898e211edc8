//! Parsing of the user identity token carried by ActivateSession.

use log::warn;
use uaserve_types::{
    AnonymousIdentityToken, ByteString, Context, ExtensionObject, ObjectId, UserNameIdentityToken,
    X509IdentityToken,
};

use crate::authenticator::Password;

/// The parsed user identity from an ActivateSession request.
#[derive(Debug, Clone)]
pub enum IdentityToken {
    /// Anonymous access. Also the interpretation of an empty token.
    Anonymous,
    /// User name and password.
    UserName(String, Password),
    /// An X509 certificate.
    X509(ByteString),
    /// A token that could not be interpreted.
    Invalid,
}

impl IdentityToken {
    /// Parse the extension object of an ActivateSession request. An empty
    /// object reads as anonymous, per part 4.
    pub fn new(object: &ExtensionObject, ctx: &Context<'_>) -> IdentityToken {
        if object.is_null() {
            return IdentityToken::Anonymous;
        }
        match object.object_id() {
            Some(ObjectId::AnonymousIdentityToken_Encoding_DefaultBinary) => {
                match object.decode_inner::<AnonymousIdentityToken>(ctx) {
                    Ok(_) => IdentityToken::Anonymous,
                    Err(_) => IdentityToken::Invalid,
                }
            }
            Some(ObjectId::UserNameIdentityToken_Encoding_DefaultBinary) => {
                match object.decode_inner::<UserNameIdentityToken>(ctx) {
                    Ok(token) => {
                        if !token.encryption_algorithm.is_null() {
                            // Password decryption needs the channel crypto,
                            // which unsecured endpoints do not have.
                            warn!(
                                "Rejecting username token with encryption algorithm {}",
                                token.encryption_algorithm
                            );
                            return IdentityToken::Invalid;
                        }
                        let password =
                            String::from_utf8(token.password.as_ref().to_vec()).unwrap_or_default();
                        IdentityToken::UserName(
                            token.user_name.as_ref().to_string(),
                            Password::new(password),
                        )
                    }
                    Err(_) => IdentityToken::Invalid,
                }
            }
            Some(ObjectId::X509IdentityToken_Encoding_DefaultBinary) => {
                match object.decode_inner::<X509IdentityToken>(ctx) {
                    Ok(token) => IdentityToken::X509(token.certificate_data),
                    Err(_) => IdentityToken::Invalid,
                }
            }
            _ => IdentityToken::Invalid,
        }
    }
}
