//! The server object: listener accept loop and the periodic tasks driving
//! subscriptions, session expiry and channel cleanup.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use futures::{future::Either, stream::FuturesUnordered, StreamExt};
use log::{error, info};
use parking_lot::{Mutex, RwLock};
use tokio::{
    net::TcpListener,
    pin,
    task::JoinHandle,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;

use uaserve_core::comms::secure_channel::{Role, SecureChannel};
use uaserve_types::{ServerState, StatusCode};

use crate::{
    address_space::{populate_core_namespace, AddressSpace},
    builder::ServerBuilder,
    channels::SecureChannelManager,
    config::ServerConfig,
    info::ServerInfo,
    session::{
        controller::{ControllerContext, SessionController},
        manager::SessionManager,
    },
    subscriptions::SubscriptionCache,
    transport::tcp::{TcpConnector, TransportConfig},
};

/// A handle to a running server: the shared state an embedder uses to
/// populate the address space and stop the server.
#[derive(Clone)]
pub struct ServerHandle {
    info: Arc<ServerInfo>,
    address_space: Arc<RwLock<AddressSpace>>,
    subscriptions: Arc<SubscriptionCache>,
    token: CancellationToken,
}

impl ServerHandle {
    /// The shared server info.
    pub fn info(&self) -> &Arc<ServerInfo> {
        &self.info
    }

    /// The address space of the server.
    pub fn address_space(&self) -> &Arc<RwLock<AddressSpace>> {
        &self.address_space
    }

    /// The subscription cache of the server.
    pub fn subscriptions(&self) -> &Arc<SubscriptionCache> {
        &self.subscriptions
    }

    /// The cancellation token stopping the server.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop the server.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// The server. Consumed by [`Server::run`].
pub struct Server {
    info: Arc<ServerInfo>,
    config: Arc<ServerConfig>,
    address_space: Arc<RwLock<AddressSpace>>,
    session_manager: Arc<RwLock<SessionManager>>,
    channel_manager: Arc<Mutex<SecureChannelManager>>,
    subscriptions: Arc<SubscriptionCache>,
    session_notify: Arc<tokio::sync::Notify>,
    connections: FuturesUnordered<JoinHandle<u32>>,
    token: CancellationToken,
}

impl Server {
    pub(crate) fn new_from_builder(builder: ServerBuilder) -> Result<(Self, ServerHandle), String> {
        use uaserve_core::config::Config;
        let errors = builder.config.validate();
        if !errors.is_empty() {
            return Err(format!("Server configuration is invalid: {}", errors.join(", ")));
        }

        let config = Arc::new(builder.config);
        let authenticator = builder.authenticator.unwrap_or_else(|| {
            Arc::new(crate::authenticator::DefaultAuthenticator::new(
                config.user_tokens.clone(),
            ))
        });
        let info = Arc::new(ServerInfo::new(config.clone(), authenticator));

        let mut address_space = AddressSpace::new();
        populate_core_namespace(&mut address_space, &config.application_uri);
        let address_space = Arc::new(RwLock::new(address_space));

        let subscriptions = Arc::new(SubscriptionCache::new(config.limits.subscriptions));
        let session_notify = Arc::new(tokio::sync::Notify::new());
        let session_manager = Arc::new(RwLock::new(SessionManager::new(
            info.clone(),
            session_notify.clone(),
        )));
        let channel_manager = Arc::new(Mutex::new(SecureChannelManager::new()));
        let token = CancellationToken::new();

        let handle = ServerHandle {
            info: info.clone(),
            address_space: address_space.clone(),
            subscriptions: subscriptions.clone(),
            token: token.clone(),
        };

        Ok((
            Self {
                info,
                config,
                address_space,
                session_manager,
                channel_manager,
                subscriptions,
                session_notify,
                connections: FuturesUnordered::new(),
                token,
            },
            handle,
        ))
    }

    /// Run the server on the configured host and port.
    pub async fn run(self) -> Result<(), String> {
        let Some(addr) = self.socket_address() else {
            return Err("Cannot resolve server address, check server configuration".to_owned());
        };
        info!("Try to bind address at {addr}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind socket: {e:?}"))?;
        self.run_with(listener).await
    }

    /// Run the server on an existing listener. Useful for tests, which
    /// bind port 0 to get an arbitrary free port.
    pub async fn run_with(mut self, listener: TcpListener) -> Result<(), String> {
        let addr = listener
            .local_addr()
            .map_err(|e| format!("Failed to read socket address: {e:?}"))?;
        info!("Now listening for connections on {addr}");
        self.info.state.store(Arc::new(ServerState::Running));
        self.info
            .start_time
            .store(Arc::new(uaserve_types::DateTime::now()));

        let subscription_fut = Self::run_subscription_ticks(
            self.config.subscription_poll_interval_ms,
            self.subscriptions.clone(),
            self.address_space.clone(),
        );
        pin!(subscription_fut);
        let session_expiry_fut = Self::run_session_expiry(
            self.session_manager.clone(),
            self.channel_manager.clone(),
            self.subscriptions.clone(),
            self.session_notify.clone(),
        );
        pin!(session_expiry_fut);
        let channel_expiry_fut = Self::run_channel_expiry(
            self.config.cleanup_interval_ms,
            self.channel_manager.clone(),
        );
        pin!(channel_expiry_fut);

        let mut connection_counter = 0u32;

        loop {
            let conn_fut = if self.connections.is_empty() {
                if self.token.is_cancelled() {
                    break;
                }
                Either::Left(futures::future::pending())
            } else {
                Either::Right(self.connections.next())
            };

            tokio::select! {
                conn_res = conn_fut => {
                    match conn_res.expect("joined connection set is nonempty") {
                        Ok(id) => {
                            info!("Connection {} terminated", id);
                        }
                        Err(e) => error!("Connection panic! {e}"),
                    }
                }
                _ = &mut subscription_fut => {}
                _ = &mut session_expiry_fut => {}
                _ = &mut channel_expiry_fut => {}
                rs = listener.accept() => {
                    match rs {
                        Ok((socket, addr)) => {
                            info!("Accept new connection from {addr} ({connection_counter})");
                            let handle = self.spawn_connection(socket, connection_counter);
                            self.connections.push(handle);
                            connection_counter += 1;
                        }
                        Err(e) => {
                            error!("Failed to accept client connection: {:?}", e);
                        }
                    }
                }
                _ = self.token.cancelled() => {
                    info!("Server stopping");
                    break;
                }
            }
        }

        self.info.state.store(Arc::new(ServerState::Shutdown));
        Ok(())
    }

    fn spawn_connection(
        &self,
        socket: tokio::net::TcpStream,
        connection_id: u32,
    ) -> JoinHandle<u32> {
        let limits = &self.info.config.limits;
        let connector = TcpConnector::new(
            socket,
            TransportConfig {
                send_buffer_size: limits.send_buffer_size,
                receive_buffer_size: limits.receive_buffer_size,
                max_message_size: limits.max_message_size,
                max_chunk_count: limits.max_chunk_count,
                hello_timeout: Duration::from_secs(
                    self.info.config.tcp_config.hello_timeout as u64,
                ),
            },
            self.info.decoding_options(),
        );

        let ctx = ControllerContext {
            info: self.info.clone(),
            session_manager: self.session_manager.clone(),
            channel_manager: self.channel_manager.clone(),
            address_space: self.address_space.clone(),
            subscriptions: self.subscriptions.clone(),
        };
        let info = self.info.clone();
        let cancel = self.token.child_token();

        tokio::spawn(async move {
            match connector.connect(info.clone(), cancel.clone()).await {
                Ok(transport) => {
                    let channel =
                        SecureChannel::new(Role::Server, info.decoding_options());
                    let controller = SessionController::new(transport, channel, ctx, cancel);
                    controller.run().await;
                }
                Err(status) => {
                    error!("Connection {connection_id} failed during handshake: {status}");
                }
            }
            connection_id
        })
    }

    async fn run_subscription_ticks(
        interval_ms: u64,
        subscriptions: Arc<SubscriptionCache>,
        address_space: Arc<RwLock<AddressSpace>>,
    ) {
        let mut tick = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let address_space = address_space.read();
            subscriptions.periodic_tick(&address_space);
        }
    }

    async fn run_session_expiry(
        session_manager: Arc<RwLock<SessionManager>>,
        channel_manager: Arc<Mutex<SecureChannelManager>>,
        subscriptions: Arc<SubscriptionCache>,
        notify: Arc<tokio::sync::Notify>,
    ) {
        loop {
            let (expiry, expired) = session_manager.read().check_session_expiry();
            for id in expired {
                let session = session_manager.write().expire_session(&id);
                if let Some(session) = session {
                    let session = session.read();
                    channel_manager
                        .lock()
                        .set_session_bound(session.secure_channel_id(), false);
                    subscriptions.delete_session_subscriptions(
                        session.session_id_numeric(),
                        StatusCode::BadSessionClosed,
                    );
                }
            }
            // Wake either at the next deadline or when a session was
            // created, whichever comes first.
            tokio::select! {
                _ = tokio::time::sleep_until(expiry) => {}
                _ = notify.notified() => {}
            }
        }
    }

    async fn run_channel_expiry(
        interval_ms: u64,
        channel_manager: Arc<Mutex<SecureChannelManager>>,
    ) {
        let mut tick = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            channel_manager.lock().check_expired(Instant::now());
        }
    }

    fn socket_address(&self) -> Option<SocketAddr> {
        let address = format!(
            "{}:{}",
            self.config.tcp_config.host, self.config.tcp_config.port
        );
        address.to_socket_addrs().ok().and_then(|mut a| a.next())
    }
}
