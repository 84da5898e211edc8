#![warn(missing_docs)]

//! An OPC UA server runtime: a typed address space, the UA-TCP binary
//! transport, secure channel and session lifecycles, the service sets the
//! core of the protocol requires, and a subscription engine.
//!
//! A server is assembled through the [`ServerBuilder`], populated through
//! the [`ServerHandle`] it returns, and driven by [`Server::run`].
//!
//! ```ignore
//! let (server, handle) = ServerBuilder::new()
//!     .application("demo", "urn:demo")
//!     .host_and_port("127.0.0.1", 4840)
//!     .build()?;
//! // hang nodes off the address space through handle.address_space()
//! server.run().await?;
//! ```

pub mod address_space;
pub mod authenticator;
pub mod builder;
pub mod channels;
pub mod config;
pub mod identity_token;
pub mod info;
pub mod server;
pub mod services;
pub mod session;
pub mod subscriptions;
mod transport;

pub use address_space::AddressSpace;
pub use authenticator::{AuthManager, DefaultAuthenticator, Password, UserToken};
pub use builder::ServerBuilder;
pub use config::ServerConfig;
pub use identity_token::IdentityToken;
pub use info::ServerInfo;
pub use server::{Server, ServerHandle};
pub use subscriptions::SubscriptionCache;
