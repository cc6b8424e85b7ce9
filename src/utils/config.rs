use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use chrono_tz::Tz;
use lettre::message::Mailbox;

impl Config {
    /// Load a `.toml` file from disk and parse it as a [`Config`], then apply environment overrides.
    pub async fn load(file: &str) -> anyhow::Result<Config> {
        async fn load_inner(file: &str) -> anyhow::Result<Config> {
            let contents = tokio::fs::read_to_string(file).await?;
            Ok(toml::from_str(&contents)?)
        }
        let mut config = load_inner(file).await.with_context(|| format!("loading config={file}"))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Secrets come from the environment when set, taking precedence over the file.
    ///
    /// * `DATABASE_URL` -> `db.url`
    /// * `EMAIL_USER` -> `email.smtp_username`
    /// * `EMAIL_PASS` -> `email.smtp_password`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("DATABASE_URL") {
            self.db.url = url;
        }
        if let Some(user) = var("EMAIL_USER") {
            self.email.smtp_username = Some(user);
        }
        if let Some(pass) = var("EMAIL_PASS") {
            self.email.smtp_password = Some(pass);
        }
    }
}

/// Bag of app configuration values, parsed from a TOML file with serde.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub db: DbConfig,
    pub net: NetConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    /// Geolocation enrichment is enabled only when this section is present.
    pub geo: Option<GeoConfig>,
}

/// Webapp configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AppConfig {
    /// Site name used in notification emails, e.g. `HookLogic`.
    pub name: String,
    /// Local timezone, used to stamp submissions.
    #[serde(default = "default_tz")]
    pub tz: Tz,
}

fn default_tz() -> Tz {
    chrono_tz::Asia::Kolkata
}

/// Database configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DbConfig {
    /// SQLite connection string, e.g. `sqlite://data/hooklogic.db`.
    pub url: String,
}

/// Networking configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NetConfig {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Serve HTTPS with this certificate instead of plain HTTP.
    pub tls: Option<TlsConfig>,
}

/// PEM encoded TLS certificate chain and private key.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Cross-origin configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API. Any other `Origin` is rejected.
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let origins = [
            "http://localhost:5173",
            "http://localhost:3000",
            "https://hooklogic.onrender.com",
            "https://hooklogic.vercel.app",
        ];
        Self { origins: origins.into_iter().map(String::from).collect() }
    }
}

/// Email configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct EmailConfig {
    /// SMTP address, starting with `smtp://` or `smtps://`.
    pub smtp_addr: String,
    /// SMTP username.
    pub smtp_username: Option<String>,
    /// SMTP password.
    pub smtp_password: Option<String>,
    /// Mailbox to send email from. Defaults to `"<app.name> Website" <smtp_username>`.
    pub from: Option<Mailbox>,
    /// Operator mailbox receiving notifications. Defaults to the sender.
    pub to: Option<Mailbox>,
    /// Upper bound on each SMTP connect, greeting and socket operation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of notifications waiting to be sent.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum number of notifications being sent at once.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_queue_capacity() -> usize {
    64
}
fn default_workers() -> usize {
    4
}

/// Contact form rules.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct ContactConfig {
    /// Treat `phone` as a required field.
    #[serde(default)]
    pub require_phone: bool,
}

/// IP geolocation lookup configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct GeoConfig {
    /// Lookup endpoint, the client IP is appended as the last path segment.
    #[serde(default = "default_geo_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geo_url() -> String {
    "http://ip-api.com/json".into()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const MINIMAL: &str = r#"
        [app]
        name = "HookLogic"

        [db]
        url = "sqlite::memory:"

        [net]
        addr = "127.0.0.1:5000"

        [email]
        smtp_addr = "smtp://localhost:2525"
        smtp_username = "site@hooklogic.test"
    "#;

    pub fn minimal() -> Config {
        toml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn defaults_are_filled_in() {
        let config = minimal();
        assert_eq!(config.app.tz, chrono_tz::Asia::Kolkata);
        assert_eq!(config.email.timeout_secs, 10);
        assert_eq!(config.email.queue_capacity, 64);
        assert_eq!(config.email.workers, 4);
        assert!(!config.contact.require_phone);
        assert!(config.geo.is_none());
        assert!(config.cors.origins.iter().any(|o| o == "https://hooklogic.vercel.app"));
    }

    #[test]
    fn geo_section_enables_lookup() {
        let config: Config = toml::from_str(&format!("{MINIMAL}\n[geo]\n")).unwrap();
        let geo = config.geo.unwrap();
        assert_eq!(geo.url, "http://ip-api.com/json");
        assert_eq!(geo.timeout_secs, 10);
    }

    #[test]
    fn environment_overrides_secrets() {
        let mut config = minimal();
        config.apply_env(|key| match key {
            "DATABASE_URL" => Some("sqlite://prod.db".into()),
            "EMAIL_PASS" => Some("hunter2".into()),
            _ => None,
        });
        assert_eq!(config.db.url, "sqlite://prod.db");
        assert_eq!(config.email.smtp_username.as_deref(), Some("site@hooklogic.test"));
        assert_eq!(config.email.smtp_password.as_deref(), Some("hunter2"));
    }
}
