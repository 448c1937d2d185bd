use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime configuration. Read from an optional `appsettings` file and then
/// the process environment (`DB_HOST`, `ADMIN_PASSWORD_HASH`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    pub db_name: String,
    /// CA bundle used to verify the database server certificate.
    #[serde(default)]
    pub db_ssl_ca: Option<PathBuf>,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: u32,
    #[serde(default = "default_timeout")]
    pub db_timeout_seconds: u64,

    /// Key material for signing session cookies.
    pub secret: String,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Hex SHA-256 of the admin password.
    pub admin_password_hash: String,
    #[serde(default)]
    pub cookie_secure: bool,

    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("imagenes")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    /// libpq keyword/value connection string. TLS is verified against
    /// `db_ssl_ca` when one is configured.
    pub fn database_url(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote(&self.db_host)),
            format!("port={}", self.db_port),
            format!("user={}", quote(&self.db_user)),
            format!("password={}", quote(&self.db_password)),
            format!("dbname={}", quote(&self.db_name)),
        ];
        match self.db_ssl_ca.as_ref().filter(|ca| !ca.as_os_str().is_empty()) {
            Some(ca) => {
                parts.push("sslmode=verify-full".to_string());
                parts.push(format!("sslrootcert={}", quote(&ca.to_string_lossy())));
            }
            None => parts.push("sslmode=prefer".to_string()),
        }
        parts.join(" ")
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            host: default_host(),
            port: default_port(),
            db_host: "db.example.com".into(),
            db_port: 12345,
            db_user: "avnadmin".into(),
            db_password: "s3cr'et".into(),
            db_name: "tienda".into(),
            db_ssl_ca: None,
            db_pool_size: default_pool_size(),
            db_timeout_seconds: default_timeout(),
            secret: "keyboard cat".into(),
            admin_username: default_admin_username(),
            admin_password_hash: String::new(),
            cookie_secure: false,
            image_dir: default_image_dir(),
            public_dir: default_public_dir(),
        }
    }

    #[test]
    fn database_url_quotes_values() {
        let settings = test_settings();
        assert_eq!(
            settings.database_url(),
            "host='db.example.com' port=12345 user='avnadmin' password='s3cr\\'et' dbname='tienda' sslmode=prefer"
        );
    }

    #[test]
    fn database_url_verifies_with_ca() {
        let settings = Settings {
            db_ssl_ca: Some(PathBuf::from("/etc/ssl/ca.pem")),
            ..test_settings()
        };
        let url = settings.database_url();
        assert!(url.contains("sslmode=verify-full"));
        assert!(url.ends_with("sslrootcert='/etc/ssl/ca.pem'"));
    }
}
