use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
    /// UTC hour at which the daily deadline sweep runs.
    pub sweep_hour: u32,
    pub completion_policy: CompletionPolicy,
    pub apply_rate_limit: u32,
    pub apply_rate_window_secs: u64,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Which signal moves a finished project from DONE to CLOSED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Only the owner's finishing confirmation closes a project.
    ConfirmOnly,
    /// An approved deliverable review also closes it.
    ReviewCloses,
}

impl CompletionPolicy {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "confirm_only" => Ok(CompletionPolicy::ConfirmOnly),
            "review_closes" => Ok(CompletionPolicy::ReviewCloses),
            other => Err(format!(
                "Invalid WORKHUB_COMPLETION_POLICY '{other}' (expected confirm_only or review_closes)"
            )),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("WORKHUB_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_HOST: {e}"))?;

        let port: u16 = env_or("WORKHUB_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_PORT: {e}"))?;

        let base_url = env_or("WORKHUB_BASE_URL", &format!("http://{host}:{port}"));

        let upload_dir = PathBuf::from(env_or("WORKHUB_UPLOAD_DIR", "uploads"));

        let max_upload_size: usize = env_or("WORKHUB_MAX_UPLOAD_SIZE", "20971520")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_MAX_UPLOAD_SIZE: {e}"))?;

        let sweep_hour: u32 = env_or("WORKHUB_SWEEP_HOUR", "0")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_SWEEP_HOUR: {e}"))?;
        if sweep_hour > 23 {
            return Err(format!("Invalid WORKHUB_SWEEP_HOUR: {sweep_hour} is not an hour of the day"));
        }

        let completion_policy =
            CompletionPolicy::parse(&env_or("WORKHUB_COMPLETION_POLICY", "confirm_only"))?;

        let apply_rate_limit: u32 = env_or("WORKHUB_APPLY_RATE_LIMIT", "20")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_APPLY_RATE_LIMIT: {e}"))?;

        let apply_rate_window_secs: u64 = env_or("WORKHUB_APPLY_RATE_WINDOW_SECS", "3600")
            .parse()
            .map_err(|e| format!("Invalid WORKHUB_APPLY_RATE_WINDOW_SECS: {e}"))?;

        let log_level = env_or("WORKHUB_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("WORKHUB_SMTP_HOST").ok(),
            std::env::var("WORKHUB_SMTP_PORT").ok(),
            std::env::var("WORKHUB_SMTP_USER").ok(),
            std::env::var("WORKHUB_SMTP_PASS").ok(),
            std::env::var("WORKHUB_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid WORKHUB_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            upload_dir,
            max_upload_size,
            sweep_hour,
            completion_policy,
            apply_rate_limit,
            apply_rate_window_secs,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
