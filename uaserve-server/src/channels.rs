//! The secure channel manager: server-wide bookkeeping of all open
//! channels, enforcing the channel limit and expiring channels whose token
//! lifetime has lapsed.

use std::collections::HashMap;

use log::{debug, info, warn};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uaserve_types::StatusCode;

use crate::info::ServerInfo;

/// Bookkeeping for one open channel.
struct ChannelEntry {
    /// Monotonic deadline `created_at + revised_lifetime` of the newest
    /// token.
    expires_at: Instant,
    /// Number of sessions bound to the channel. Channels without sessions
    /// are purged first under channel pressure.
    bound_sessions: usize,
    /// Cancelling this token tears the connection down. Teardown happens
    /// in the connection's own task, after any in-flight dispatch
    /// completed, so removal is effectively deferred.
    cancel: CancellationToken,
}

/// The result of opening or renewing a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// The channel id, allocated monotonically on open.
    pub channel_id: u32,
    /// The token id, allocated monotonically per server.
    pub token_id: u32,
    /// The granted lifetime in milliseconds.
    pub revised_lifetime: u32,
}

/// Server-wide channel bookkeeping.
pub struct SecureChannelManager {
    channels: HashMap<u32, ChannelEntry>,
}

impl SecureChannelManager {
    /// Create an empty channel manager.
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// The number of open channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// `true` if no channels are open.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Open a new channel. When the channel limit is reached, one channel
    /// without a bound session is purged to make room; if every channel
    /// has a session the open fails with `BadOutOfMemory`.
    pub fn open(
        &mut self,
        info: &ServerInfo,
        requested_lifetime: u32,
        cancel: CancellationToken,
    ) -> Result<IssuedToken, StatusCode> {
        let max = info.config.limits.max_secure_channels;
        if self.channels.len() >= max && !self.purge_one_sessionless() {
            warn!("Open secure channel rejected, channel limit {max} reached");
            return Err(StatusCode::BadOutOfMemory);
        }

        let channel_id = info.secure_channel_id_handle.next();
        let token_id = info.token_id_handle.next();
        let revised_lifetime = Self::revise_lifetime(info, requested_lifetime);

        self.channels.insert(
            channel_id,
            ChannelEntry {
                expires_at: Instant::now() + Duration::from_millis(revised_lifetime as u64),
                bound_sessions: 0,
                cancel,
            },
        );
        info!("Opened secure channel {channel_id} with token {token_id}");

        Ok(IssuedToken {
            channel_id,
            token_id,
            revised_lifetime,
        })
    }

    /// Renew the token of an existing channel. The channel id is
    /// preserved, a fresh token id is allocated and the expiry pushed out.
    pub fn renew(
        &mut self,
        info: &ServerInfo,
        channel_id: u32,
        requested_lifetime: u32,
    ) -> Result<IssuedToken, StatusCode> {
        let Some(entry) = self.channels.get_mut(&channel_id) else {
            return Err(StatusCode::BadSecureChannelIdInvalid);
        };
        let token_id = info.token_id_handle.next();
        let revised_lifetime = Self::revise_lifetime(info, requested_lifetime);
        entry.expires_at = Instant::now() + Duration::from_millis(revised_lifetime as u64);
        debug!("Renewed secure channel {channel_id} with token {token_id}");
        Ok(IssuedToken {
            channel_id,
            token_id,
            revised_lifetime,
        })
    }

    /// Record a session binding or unbinding from a channel.
    pub fn set_session_bound(&mut self, channel_id: u32, bound: bool) {
        if let Some(entry) = self.channels.get_mut(&channel_id) {
            if bound {
                entry.bound_sessions += 1;
            } else {
                entry.bound_sessions = entry.bound_sessions.saturating_sub(1);
            }
        }
    }

    /// Remove a channel from the bookkeeping, typically when its
    /// connection went away.
    pub fn remove(&mut self, channel_id: u32) {
        if self.channels.remove(&channel_id).is_some() {
            debug!("Removed secure channel {channel_id}");
        }
    }

    /// Collect the expired channels, cancelling their connections, and
    /// return the monotonic instant of the next upcoming expiry.
    pub fn check_expired(&mut self, now: Instant) -> Option<Instant> {
        let mut next_expiry: Option<Instant> = None;
        let mut expired = Vec::new();
        for (id, entry) in &self.channels {
            if entry.expires_at <= now {
                expired.push(*id);
            } else if next_expiry.map(|e| entry.expires_at < e).unwrap_or(true) {
                next_expiry = Some(entry.expires_at);
            }
        }
        for id in expired {
            if let Some(entry) = self.channels.remove(&id) {
                info!("Secure channel {id} expired, closing its connection");
                entry.cancel.cancel();
            }
        }
        next_expiry
    }

    fn purge_one_sessionless(&mut self) -> bool {
        let candidate = self
            .channels
            .iter()
            .filter(|(_, e)| e.bound_sessions == 0)
            // Purge the channel closest to its expiry.
            .min_by_key(|(_, e)| e.expires_at)
            .map(|(id, _)| *id);
        match candidate {
            Some(id) => {
                if let Some(entry) = self.channels.remove(&id) {
                    warn!("Purging session-less secure channel {id} to make room");
                    entry.cancel.cancel();
                }
                true
            }
            None => false,
        }
    }

    fn revise_lifetime(info: &ServerInfo, requested: u32) -> u32 {
        let max = info.config.limits.max_token_lifetime_ms;
        if requested == 0 {
            max
        } else {
            requested.min(max)
        }
    }
}

impl Default for SecureChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::SecureChannelManager;
    use crate::{authenticator::DefaultAuthenticator, config::ServerConfig, info::ServerInfo};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use uaserve_types::StatusCode;

    fn info(max_channels: usize) -> ServerInfo {
        let mut config = ServerConfig::default();
        config.limits.max_secure_channels = max_channels;
        ServerInfo::new(
            Arc::new(config),
            Arc::new(DefaultAuthenticator::new(BTreeMap::new())),
        )
    }

    #[test]
    fn open_allocates_monotonic_ids() {
        let info = info(10);
        let mut mgr = SecureChannelManager::new();
        let a = mgr
            .open(&info, 0, CancellationToken::new())
            .unwrap();
        let b = mgr
            .open(&info, 0, CancellationToken::new())
            .unwrap();
        assert!(b.channel_id > a.channel_id);
        assert!(b.token_id > a.token_id);
        assert_eq!(a.revised_lifetime, info.config.limits.max_token_lifetime_ms);
    }

    #[test]
    fn purge_under_pressure() {
        let info = info(1);
        let mut mgr = SecureChannelManager::new();
        let purge_me = CancellationToken::new();
        let first = mgr.open(&info, 3_600_000, purge_me.clone()).unwrap();

        // A session-less channel makes room for the new one.
        let second = mgr.open(&info, 3_600_000, CancellationToken::new()).unwrap();
        assert!(purge_me.is_cancelled());
        assert_ne!(first.channel_id, second.channel_id);

        // With a session bound there is nothing to purge.
        mgr.set_session_bound(second.channel_id, true);
        assert_eq!(
            mgr.open(&info, 3_600_000, CancellationToken::new())
                .unwrap_err(),
            StatusCode::BadOutOfMemory
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_cancels_connection() {
        let info = info(10);
        let mut mgr = SecureChannelManager::new();
        let cancel = CancellationToken::new();
        mgr.open(&info, 1_000, cancel.clone()).unwrap();

        tokio::time::advance(std::time::Duration::from_millis(1_500)).await;
        mgr.check_expired(tokio::time::Instant::now());
        assert!(cancel.is_cancelled());
        assert!(mgr.is_empty());
    }
}
