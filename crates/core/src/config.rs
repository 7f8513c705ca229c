use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub payments: PaymentsConfig,
    pub support: SupportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub api_port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PaymentsConfig {
    pub secret_key: SecretString,
    pub api_base_url: String,
    pub currency: String,
    /// Hosted-checkout redirect targets; `{lead_id}` is expanded per call.
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SupportConfig {
    pub phone: String,
    pub email: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub payments_secret_key: Option<String>,
    pub support_phone: Option<String>,
    pub support_email: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://encore.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                api_port: 8080,
                health_check_port: 8081,
                graceful_shutdown_secs: 15,
            },
            payments: PaymentsConfig {
                secret_key: String::new().into(),
                api_base_url: "https://api.stripe.com".to_string(),
                currency: "usd".to_string(),
                checkout_success_url:
                    "http://localhost:8080/booking/{lead_id}/confirmation?session_id={CHECKOUT_SESSION_ID}"
                        .to_string(),
                checkout_cancel_url: "http://localhost:8080/booking/{lead_id}/payment".to_string(),
                timeout_secs: 30,
            },
            support: SupportConfig {
                phone: "(555) 201-0100".to_string(),
                email: "bookings@encore.example".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("encore.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(api_port) = server.api_port {
                self.server.api_port = api_port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(payments) = patch.payments {
            if let Some(secret_key_value) = payments.secret_key {
                self.payments.secret_key = secret_value(secret_key_value);
            }
            if let Some(api_base_url) = payments.api_base_url {
                self.payments.api_base_url = api_base_url;
            }
            if let Some(currency) = payments.currency {
                self.payments.currency = currency;
            }
            if let Some(checkout_success_url) = payments.checkout_success_url {
                self.payments.checkout_success_url = checkout_success_url;
            }
            if let Some(checkout_cancel_url) = payments.checkout_cancel_url {
                self.payments.checkout_cancel_url = checkout_cancel_url;
            }
            if let Some(timeout_secs) = payments.timeout_secs {
                self.payments.timeout_secs = timeout_secs;
            }
        }

        if let Some(support) = patch.support {
            if let Some(phone) = support.phone {
                self.support.phone = phone;
            }
            if let Some(email) = support.email {
                self.support.email = email;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ENCORE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ENCORE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("ENCORE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ENCORE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ENCORE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ENCORE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ENCORE_SERVER_API_PORT") {
            self.server.api_port = parse_u16("ENCORE_SERVER_API_PORT", &value)?;
        }
        if let Some(value) = read_env("ENCORE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("ENCORE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("ENCORE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ENCORE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("ENCORE_PAYMENTS_SECRET_KEY") {
            self.payments.secret_key = secret_value(value);
        }
        if let Some(value) = read_env("ENCORE_PAYMENTS_API_BASE_URL") {
            self.payments.api_base_url = value;
        }
        if let Some(value) = read_env("ENCORE_PAYMENTS_CURRENCY") {
            self.payments.currency = value;
        }
        if let Some(value) = read_env("ENCORE_PAYMENTS_SUCCESS_URL") {
            self.payments.checkout_success_url = value;
        }
        if let Some(value) = read_env("ENCORE_PAYMENTS_CANCEL_URL") {
            self.payments.checkout_cancel_url = value;
        }
        if let Some(value) = read_env("ENCORE_PAYMENTS_TIMEOUT_SECS") {
            self.payments.timeout_secs = parse_u64("ENCORE_PAYMENTS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ENCORE_SUPPORT_PHONE") {
            self.support.phone = value;
        }
        if let Some(value) = read_env("ENCORE_SUPPORT_EMAIL") {
            self.support.email = value;
        }

        let log_level = read_env("ENCORE_LOGGING_LEVEL").or_else(|| read_env("ENCORE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ENCORE_LOGGING_FORMAT").or_else(|| read_env("ENCORE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(secret_key) = overrides.payments_secret_key {
            self.payments.secret_key = secret_value(secret_key);
        }
        if let Some(phone) = overrides.support_phone {
            self.support.phone = phone;
        }
        if let Some(email) = overrides.support_email {
            self.support.email = email;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_payments(&self.payments)?;
        validate_support(&self.support)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("encore.toml"), PathBuf::from("config/encore.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.api_port == 0 {
        return Err(ConfigError::Validation(
            "server.api_port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == server.api_port {
        return Err(ConfigError::Validation(
            "server.health_check_port must differ from server.api_port".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_payments(payments: &PaymentsConfig) -> Result<(), ConfigError> {
    let secret_key = payments.secret_key.expose_secret();
    if secret_key.is_empty() {
        return Err(ConfigError::Validation(
            "payments.secret_key is required. Get it from your payment dashboard > Developers > API keys".to_string(),
        ));
    }
    if !secret_key.starts_with("sk_") {
        let hint = if secret_key.starts_with("pk_") {
            " (hint: you may have used the publishable key instead of the secret key)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "payments.secret_key must start with `sk_`{hint}"
        )));
    }

    if !payments.api_base_url.starts_with("http://")
        && !payments.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "payments.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    let currency = payments.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(ConfigError::Validation(
            "payments.currency must be a lowercase 3-letter ISO 4217 code (e.g. `usd`)"
                .to_string(),
        ));
    }

    for (name, url) in [
        ("payments.checkout_success_url", &payments.checkout_success_url),
        ("payments.checkout_cancel_url", &payments.checkout_cancel_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{name} must start with http:// or https://"
            )));
        }
        if !url.contains("{lead_id}") {
            return Err(ConfigError::Validation(format!(
                "{name} must contain the `{{lead_id}}` placeholder"
            )));
        }
    }

    if payments.timeout_secs == 0 || payments.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "payments.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_support(support: &SupportConfig) -> Result<(), ConfigError> {
    if support.phone.trim().is_empty() {
        return Err(ConfigError::Validation("support.phone must not be empty".to_string()));
    }

    if !support.email.contains('@') {
        return Err(ConfigError::Validation(
            "support.email must be a valid email address".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    payments: Option<PaymentsPatch>,
    support: Option<SupportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    api_port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentsPatch {
    secret_key: Option<String>,
    api_base_url: Option<String>,
    currency: Option<String>,
    checkout_success_url: Option<String>,
    checkout_cancel_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SupportPatch {
    phone: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PAYMENTS_SECRET_KEY", "sk_test_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("encore.toml");
            fs::write(
                &path,
                r#"
[payments]
secret_key = "${TEST_PAYMENTS_SECRET_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.payments.secret_key.expose_secret() == "sk_test_from_env",
                "secret key should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PAYMENTS_SECRET_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ENCORE_PAYMENTS_SECRET_KEY", "sk_test_123");
        env::set_var("ENCORE_LOG_LEVEL", "warn");
        env::set_var("ENCORE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["ENCORE_PAYMENTS_SECRET_KEY", "ENCORE_LOG_LEVEL", "ENCORE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ENCORE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("ENCORE_PAYMENTS_SECRET_KEY", "sk_test_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("encore.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[payments]
secret_key = "sk_test_from_file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.payments.secret_key.expose_secret() == "sk_test_from_env",
                "env secret key should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["ENCORE_DATABASE_URL", "ENCORE_PAYMENTS_SECRET_KEY"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ENCORE_PAYMENTS_SECRET_KEY", "pk_test_wrong_key");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("payments.secret_key") && message.contains("publishable")
            );
            ensure(has_message, "validation failure should flag the publishable-key mixup")
        })();

        clear_vars(&["ENCORE_PAYMENTS_SECRET_KEY"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ENCORE_PAYMENTS_SECRET_KEY", "sk_live_secret_value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("sk_live_secret_value"),
                "debug output should not contain the secret key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["ENCORE_PAYMENTS_SECRET_KEY"]);
        result
    }

    #[test]
    fn checkout_urls_require_lead_id_placeholder() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ENCORE_PAYMENTS_SECRET_KEY", "sk_test_123");
        env::set_var("ENCORE_PAYMENTS_SUCCESS_URL", "https://example.com/thanks");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("{lead_id}")
                ),
                "validation should require the lead_id placeholder",
            )
        })();

        clear_vars(&["ENCORE_PAYMENTS_SECRET_KEY", "ENCORE_PAYMENTS_SUCCESS_URL"]);
        result
    }
}
