use std::sync::Arc;

use crate::config::Config;
use crate::crypto::vault::UrlVault;
use crate::error::Result;
use crate::session::protocol::GateSessions;
use crate::session::replay::InMemoryReplayGuard;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The URL vault, with its key derived once at startup.
    pub vault: Arc<UrlVault>,
    /// The gate session protocol, sharing one replay guard across requests.
    pub sessions: Arc<GateSessions>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Key derivation happens here, once, so misconfiguration fails at process
    /// start rather than on the first request.
    pub fn new(config: &Config) -> Result<Self> {
        let vault = Arc::new(UrlVault::new(&config.vault_secret)?);
        tracing::info!("✅ URL vault key derived (Argon2id, cached for process lifetime)");

        let replay = Arc::new(InMemoryReplayGuard::new(config.replay_guard_max_entries));
        let sessions = Arc::new(GateSessions::new(
            &config.token_secret,
            config.session_expiry_secs,
            replay,
        ));
        tracing::info!(
            expiry_secs = config.session_expiry_secs,
            replay_ceiling = config.replay_guard_max_entries,
            "✅ Gate session protocol initialized"
        );

        Ok(AppState {
            config: config.clone(),
            vault,
            sessions,
        })
    }
}
