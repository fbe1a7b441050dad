use std::{
    env, fs,
    sync::{Mutex, MutexGuard},
};

use oauth_config::config::{AppConfig, ConfigError, ConfigLoader};
use tempfile::TempDir;

/// base64 of 32 `a` bytes
const TEST_KEY_B64: &str = "YWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWE=";

const MANAGED_VARS: [&str; 10] = [
    "OAUTHCFG_PROFILE",
    "OAUTHCFG_API_BIND_ADDR",
    "OAUTHCFG_LOG_LEVEL",
    "OAUTHCFG_LOG_FORMAT",
    "OAUTHCFG_DATABASE_URL",
    "OAUTHCFG_DB_MAX_CONNECTIONS",
    "OAUTHCFG_DB_ACQUIRE_TIMEOUT_MS",
    "OAUTHCFG_OPERATOR_TOKEN",
    "OAUTHCFG_OPERATOR_TOKENS",
    "OAUTHCFG_CRYPTO_KEY",
];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Temp directory for `.env` files plus exclusive access to the process
/// environment. Managed variables are cleared on creation and on drop.
struct Scenario {
    dir: TempDir,
    _lock: MutexGuard<'static, ()>,
}

impl Scenario {
    fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        clear_managed_vars();
        Self {
            dir: TempDir::new().unwrap(),
            _lock: lock,
        }
    }

    fn env(self, key: &str, value: &str) -> Self {
        unsafe { env::set_var(key, value) };
        self
    }

    fn file(self, name: &str, contents: &str) -> Self {
        fs::write(self.dir.path().join(name), contents).unwrap();
        self
    }

    fn load(&self) -> Result<AppConfig, ConfigError> {
        ConfigLoader::with_base_dir(self.dir.path().to_path_buf()).load()
    }
}

impl Drop for Scenario {
    fn drop(&mut self) {
        clear_managed_vars();
    }
}

fn clear_managed_vars() {
    for key in MANAGED_VARS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn defaults_apply_when_only_secrets_are_set() {
    let cfg = Scenario::new()
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .load()
        .unwrap();

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.log_format, "json");
    assert_eq!(cfg.database_url, "postgresql://localhost:5432/oauth_config");
    assert_eq!(cfg.db_max_connections, 10);
    assert_eq!(cfg.db_acquire_timeout_ms, 5000);
    assert_eq!(cfg.operator_tokens, vec!["token".to_string()]);
    assert_eq!(cfg.crypto_key.as_deref(), Some(&[b'a'; 32][..]));
    assert!(cfg.bind_addr().is_ok());
}

#[test]
fn profile_files_override_base_files() {
    // .env.local selects the profile before the profile files are read
    let cfg = Scenario::new()
        .file(".env", "OAUTHCFG_API_BIND_ADDR=127.0.0.1:3000\n")
        .file(
            ".env.local",
            &format!(
                "OAUTHCFG_PROFILE=test\nOAUTHCFG_API_BIND_ADDR=127.0.0.1:4000\n\
                 OAUTHCFG_OPERATOR_TOKEN=layered-token\nOAUTHCFG_CRYPTO_KEY={TEST_KEY_B64}\n"
            ),
        )
        .file(
            ".env.test",
            "OAUTHCFG_API_BIND_ADDR=192.168.0.10:5000\nOAUTHCFG_DATABASE_URL=sqlite::memory:\n",
        )
        .file(".env.test.local", "OAUTHCFG_API_BIND_ADDR=10.0.0.5:6000\n")
        .load()
        .unwrap();

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    assert_eq!(cfg.database_url, "sqlite::memory:");
    assert_eq!(cfg.operator_tokens, vec!["layered-token".to_string()]);
}

#[test]
fn process_environment_wins_over_files() {
    let cfg = Scenario::new()
        .file(
            ".env",
            "OAUTHCFG_API_BIND_ADDR=127.0.0.1:3000\nOAUTHCFG_OPERATOR_TOKENS=one, two ,\n",
        )
        .env("OAUTHCFG_API_BIND_ADDR", "0.0.0.0:9090")
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .load()
        .unwrap();

    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");
    assert_eq!(cfg.operator_tokens, vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn unprefixed_keys_are_ignored() {
    let cfg = Scenario::new()
        .file(".env", "API_BIND_ADDR=127.0.0.1:1\nLOG_LEVEL=trace\n")
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .load()
        .unwrap();

    assert_eq!(cfg.api_bind_addr, "0.0.0.0:8080");
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let err = Scenario::new()
        .env("OAUTHCFG_API_BIND_ADDR", "not-an-addr")
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .load()
        .unwrap_err();

    assert!(err.to_string().contains("invalid api bind address"));
}

#[test]
fn non_numeric_pool_size_is_rejected() {
    let err = Scenario::new()
        .env("OAUTHCFG_DB_MAX_CONNECTIONS", "lots")
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .load()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidNumber {
            key: "DB_MAX_CONNECTIONS",
            ..
        }
    ));
}

#[test]
fn crypto_key_is_required() {
    let err = Scenario::new()
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::MissingCryptoKey));
}

#[test]
fn crypto_key_must_be_32_bytes() {
    // "c2hvcnQ=" decodes to "short"
    let err = Scenario::new()
        .env("OAUTHCFG_OPERATOR_TOKEN", "token")
        .env("OAUTHCFG_CRYPTO_KEY", "c2hvcnQ=")
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidCryptoKeyLength { length: 5 }));
}

#[test]
fn operator_tokens_are_required() {
    let err = Scenario::new()
        .env("OAUTHCFG_CRYPTO_KEY", TEST_KEY_B64)
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::MissingOperatorTokens));
}
