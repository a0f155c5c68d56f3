use std::env;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// Development fallback for the vault secret. Never used when `APP_ENV=production`.
const DEV_VAULT_SECRET: &str = "dev-only-vault-secret-do-not-deploy";
/// Development fallback for the token-signing secret. Never used when `APP_ENV=production`.
const DEV_TOKEN_SECRET: &str = "dev-only-token-secret-do-not-deploy";

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// Long-term secret the vault key is derived from.
    pub vault_secret: Zeroizing<String>,
    /// Long-term secret used to sign session tokens.
    pub token_secret: Zeroizing<String>,
    /// API key required by the link-generation endpoints.
    pub api_key: String,
    /// Public base URL used when rendering absolute safelinks.
    pub public_base_url: String,
    /// How long a gate session token stays valid, in seconds.
    pub session_expiry_secs: i64,
    /// Ceiling on the consumed-nonce replay guard before it is cleared.
    pub replay_guard_max_entries: usize,
    /// Countdown length of the first interstitial page, in seconds.
    pub page1_timer_secs: u64,
    /// Countdown length of the second interstitial page, in seconds.
    pub page2_timer_secs: u64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Missing secrets fall back to clearly-flagged development defaults unless
    /// `APP_ENV=production`, in which case startup fails fast.
    pub fn from_env() -> Result<Self> {
        let is_production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        let vault_secret = match env::var("SAFELINK_VAULT_SECRET") {
            Ok(s) if !s.is_empty() => Zeroizing::new(s),
            _ if is_production => {
                anyhow::bail!("SAFELINK_VAULT_SECRET must be set in production")
            }
            _ => {
                tracing::warn!(
                    "⚠️  SAFELINK_VAULT_SECRET not set - using INSECURE development default"
                );
                Zeroizing::new(DEV_VAULT_SECRET.to_string())
            }
        };

        let token_secret = match env::var("SAFELINK_TOKEN_SECRET") {
            Ok(s) if !s.is_empty() => Zeroizing::new(s),
            _ if is_production => {
                anyhow::bail!("SAFELINK_TOKEN_SECRET must be set in production")
            }
            _ => {
                tracing::warn!(
                    "⚠️  SAFELINK_TOKEN_SECRET not set - using INSECURE development default"
                );
                Zeroizing::new(DEV_TOKEN_SECRET.to_string())
            }
        };

        Ok(Self {
            vault_secret,
            token_secret,
            api_key: env::var("SAFELINK_API_KEY")
                .unwrap_or_else(|_| "demo123".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string()),
            session_expiry_secs: env::var("SESSION_EXPIRY_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid SESSION_EXPIRY_SECS")?,
            replay_guard_max_entries: env::var("REPLAY_GUARD_MAX_ENTRIES")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()
                .context("Invalid REPLAY_GUARD_MAX_ENTRIES")?,
            page1_timer_secs: env::var("PAGE1_TIMER_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid PAGE1_TIMER_SECS")?,
            page2_timer_secs: env::var("PAGE2_TIMER_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid PAGE2_TIMER_SECS")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment access is process-global; serialize these tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_safelink_env() {
        unsafe {
            env::remove_var("APP_ENV");
            env::remove_var("SAFELINK_VAULT_SECRET");
            env::remove_var("SAFELINK_TOKEN_SECRET");
        }
    }

    #[test]
    fn production_fails_fast_without_secrets() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_safelink_env();
        unsafe { env::set_var("APP_ENV", "production") };

        assert!(Config::from_env().is_err());

        unsafe { env::remove_var("APP_ENV") };
    }

    #[test]
    fn development_falls_back_to_flagged_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_safelink_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.vault_secret.as_str(), DEV_VAULT_SECRET);
        assert_eq!(config.token_secret.as_str(), DEV_TOKEN_SECRET);
    }

    #[test]
    fn production_accepts_explicit_secrets() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_safelink_env();
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("SAFELINK_VAULT_SECRET", "prod-vault-secret");
            env::set_var("SAFELINK_TOKEN_SECRET", "prod-token-secret");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.vault_secret.as_str(), "prod-vault-secret");
        assert_eq!(config.token_secret.as_str(), "prod-token-secret");

        clear_safelink_env();
    }
}
