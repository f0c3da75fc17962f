use std::{env, path::PathBuf};

use anyhow::{Context, bail};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub otp_ttl_minutes: i64,
    pub max_upload_bytes: usize,
    pub outbox_poll_seconds: u64,
    pub smtp: Option<SmtpConfig>,
    pub storage: StorageConfig,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Clone)]
pub enum StorageConfig {
    /// Cloudflare R2 through its S3-compatible endpoint.
    R2 {
        account_id: String,
        access_key_id: String,
        secret_access_key: String,
        bucket: String,
        public_url_base: String,
    },
    Local {
        root: PathBuf,
        public_url_base: String,
    },
    Disabled,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageConfig::R2 {
                account_id, bucket, ..
            } => f
                .debug_struct("R2")
                .field("account_id", account_id)
                .field("bucket", bucket)
                .field("secret_access_key", &"[REDACTED]")
                .finish(),
            StorageConfig::Local { root, .. } => {
                f.debug_struct("Local").field("root", root).finish()
            }
            StorageConfig::Disabled => f.write_str("Disabled"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000)?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24)?,
            otp_ttl_minutes: parse_or("OTP_TTL_MINUTES", 5)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
            outbox_poll_seconds: parse_or("OUTBOX_POLL_SECONDS", 15)?,
            smtp: smtp_from_env()?,
            storage: storage_from_env()?,
        })
    }
}

fn smtp_from_env() -> anyhow::Result<Option<SmtpConfig>> {
    let (Ok(username), Ok(password)) = (env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD"))
    else {
        tracing::warn!("SMTP credentials missing; outgoing email is disabled");
        return Ok(None);
    };
    Ok(Some(SmtpConfig {
        host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
        port: parse_or("SMTP_PORT", 465)?,
        from: env::var("SMTP_FROM").unwrap_or_else(|_| username.clone()),
        username,
        password,
    }))
}

fn storage_from_env() -> anyhow::Result<StorageConfig> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "r2".to_string());
    match backend.as_str() {
        "r2" => {
            let vars = [
                "R2_ACCOUNT_ID",
                "R2_ACCESS_KEY_ID",
                "R2_SECRET_ACCESS_KEY",
                "R2_BUCKET_NAME",
                "R2_PUBLIC_URL_BASE",
            ]
            .map(|name| env::var(name).ok());
            match vars {
                [
                    Some(account_id),
                    Some(access_key_id),
                    Some(secret_access_key),
                    Some(bucket),
                    Some(public_url_base),
                ] => Ok(StorageConfig::R2 {
                    account_id,
                    access_key_id,
                    secret_access_key,
                    bucket,
                    public_url_base,
                }),
                _ => {
                    tracing::warn!("R2 credentials missing; uploads are disabled");
                    Ok(StorageConfig::Disabled)
                }
            }
        }
        "local" => Ok(StorageConfig::Local {
            root: env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            public_url_base: env::var("LOCAL_PUBLIC_URL_BASE")
                .unwrap_or_else(|_| "/uploads".to_string()),
        }),
        "disabled" => Ok(StorageConfig::Disabled),
        other => bail!("unknown STORAGE_BACKEND {other:?}"),
    }
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u16 = parse_or("NILA_TEST_SURELY_UNSET_PORT", 3000).unwrap();
        assert_eq!(value, 3000);
    }

    #[test]
    fn storage_config_debug_redacts_secret() {
        let config = StorageConfig::R2 {
            account_id: "acct".into(),
            access_key_id: "key".into(),
            secret_access_key: "super-secret".into(),
            bucket: "nila".into(),
            public_url_base: "https://cdn".into(),
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("super-secret"));
    }
}
