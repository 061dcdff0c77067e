/**
 * Server Configuration
 *
 * This module handles loading configuration and the persisted-entity store.
 *
 * # Configuration Sources
 *
 * 1. Defaults (`AppConfig::default()`)
 * 2. An optional TOML file named by `HUDDLE_CONFIG`
 * 3. Environment overrides: `SERVER_PORT`, `DATABASE_URL`, `JWT_SECRET`,
 *    `HEARTBEAT_TIMEOUT_SECS`, `REQUIRE_TOKEN`
 *
 * The merged result is validated before the server starts.
 *
 * # Error Handling
 *
 * Bad configuration is fatal. A database that cannot be reached is not:
 * the server logs the failure and falls back to the in-memory store.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::auth::sessions::create_token;
use crate::backend::store::{MemoryStore, PgStore, Store};
use crate::shared::config::ConfigError;
use crate::shared::ids::PrincipalId;
use crate::shared::messaging::Principal;
use crate::shared::AppConfig;

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "HUDDLE_CONFIG";

/// Load configuration from the optional file and the process environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    load_config_from(path.as_deref(), |key| std::env::var(key).ok())
}

/// Load configuration from `path` (if any), then apply overrides from `lookup`
pub fn load_config_from<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            tracing::info!("[Config] Reading configuration from {}", path.display());
            let source = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&source)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides through `lookup`
///
/// Taking a lookup function keeps this testable without touching the real
/// process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("SERVER_PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT is not a port: {}", port)))?;
    }

    if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
        config.database.url = Some(url);
    }

    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }

    if let Some(timeout) = lookup("HEARTBEAT_TIMEOUT_SECS") {
        config.realtime.heartbeat_timeout_secs = timeout.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("HEARTBEAT_TIMEOUT_SECS is not a number: {}", timeout))
        })?;
    }

    if let Some(require) = lookup("REQUIRE_TOKEN") {
        config.auth.require_token = match require.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "REQUIRE_TOKEN must be a boolean, got {}",
                    other
                )))
            }
        };
    }

    Ok(())
}

/// Open the configured store and seed principals
///
/// Uses PostgreSQL when a database URL is set, falling back to the
/// in-memory store if the connection fails.
pub async fn load_store(config: &AppConfig) -> Arc<dyn Store> {
    let store: Arc<dyn Store> = match &config.database.url {
        Some(url) => match PgStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("[Config] Failed to connect to database: {}", e);
                tracing::warn!("[Config] Falling back to the in-memory store");
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            tracing::warn!("[Config] DATABASE_URL not set. Using the in-memory store.");
            Arc::new(MemoryStore::new())
        }
    };

    seed_principals(config, store.as_ref()).await;
    store
}

async fn seed_principals(config: &AppConfig, store: &dyn Store) {
    for seed in &config.seed_principals {
        let principal = Principal {
            id: seed.id.map(PrincipalId::from).unwrap_or_default(),
            role: seed.role,
            display_name: seed.display_name.clone(),
        };

        match store.insert_principal(principal).await {
            Ok(record) => {
                tracing::info!(
                    "[Config] Seeded principal {} ({}) as {}",
                    record.principal.display_name,
                    record.principal.id,
                    record.principal.role.as_str()
                );
                match create_token(
                    &record.principal,
                    &config.auth.jwt_secret,
                    config.auth.token_ttl_secs,
                ) {
                    Ok(token) => tracing::debug!(
                        "[Config] Token for {}: {}",
                        record.principal.display_name,
                        token
                    ),
                    Err(e) => tracing::warn!("[Config] Could not issue seed token: {}", e),
                }
            }
            Err(e) => tracing::warn!("[Config] Failed to seed principal {}: {}", seed.display_name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::messaging::Role;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SERVER_PORT", "8080"),
                ("DATABASE_URL", "postgres://localhost/huddle"),
                ("JWT_SECRET", "s3cret"),
                ("HEARTBEAT_TIMEOUT_SECS", "90"),
                ("REQUIRE_TOKEN", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/huddle"));
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.realtime.heartbeat_timeout_secs, 90);
        assert!(config.auth.require_token);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("SERVER_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let mut config = AppConfig::default();
        assert!(apply_env_overrides(&mut config, env(&[("REQUIRE_TOKEN", "maybe")])).is_err());
    }

    #[test]
    fn test_blank_database_url_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database.url, None);
    }

    #[test]
    fn test_load_config_from_file_then_env() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 4000

[realtime]
heartbeat_interval_secs = 10
heartbeat_timeout_secs = 30

[[principals]]
display_name = "alice"
role = "ADMIN"
"#
        )
        .unwrap();

        let config = load_config_from(Some(file.path()), env(&[("SERVER_PORT", "4001")])).unwrap();
        assert_eq!(config.server.port, 4001);
        assert_eq!(config.realtime.heartbeat_timeout_secs, 30);
        assert_eq!(config.seed_principals.len(), 1);
        assert_eq!(config.seed_principals[0].role, Role::Admin);
    }

    #[test]
    fn test_load_config_rejects_invalid_merge() {
        // Timeout below the default interval
        let err = load_config_from(None, env(&[("HEARTBEAT_TIMEOUT_SECS", "5")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/huddle.toml")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn test_load_store_seeds_principals() {
        let id = uuid::Uuid::new_v4();
        let mut config = AppConfig::builder()
            .seed_principal("alice", Role::Admin)
            .build()
            .unwrap();
        config.seed_principals[0].id = Some(id);

        let store = load_store(&config).await;
        let record = store.find_principal(PrincipalId::from(id)).await.unwrap().unwrap();
        assert_eq!(record.principal.display_name, "alice");
        assert_eq!(record.principal.role, Role::Admin);
    }
}
