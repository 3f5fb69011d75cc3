use anyhow::Context;

/// Runtime configuration, read once at startup from the environment
/// (`.env` included). Only the JWT secret is mandatory; everything else
/// has a development-friendly default.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub mail_endpoint: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub cleanup_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret =
            std::env::var("LUMEN_JWT_SECRET").context("LUMEN_JWT_SECRET must be set")?;

        Ok(Self {
            host: var_or("LUMEN_HOST", "0.0.0.0"),
            port: var_or("LUMEN_PORT", "8080")
                .parse()
                .context("LUMEN_PORT must be a port number")?,
            db_path: var_or("LUMEN_DB_PATH", "lumen.db"),
            jwt_secret,
            jwt_expiry_hours: var_or("LUMEN_JWT_EXPIRY_HOURS", "168")
                .parse()
                .context("LUMEN_JWT_EXPIRY_HOURS must be a number of hours")?,
            openrouter_api_key: var_or("OPENROUTER_API_KEY", ""),
            openrouter_model: var_or("OPENROUTER_MODEL", "google/gemini-2.0-flash-exp:free"),
            mail_endpoint: var_or("LUMEN_MAIL_ENDPOINT", "https://api.resend.com/emails"),
            mail_api_key: var_or("LUMEN_MAIL_API_KEY", ""),
            mail_from: var_or("LUMEN_MAIL_FROM", "Lumen <noreply@lumen.local>"),
            cleanup_interval_secs: var_or("LUMEN_CLEANUP_INTERVAL_SECS", "600")
                .parse()
                .context("LUMEN_CLEANUP_INTERVAL_SECS must be a number of seconds")?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
