use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_SECRET: &str = "hoops-dev-secret-change-in-production";
const DEFAULT_SESSION_DAYS: i64 = 30;
const DEFAULT_NOTIFICATION_CAPACITY: usize = 32;

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// No URL means the in-memory store
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// No password means editor sign-in is disabled
    pub editor_password: Option<String>,
    pub session_expiration_days: i64,
    pub notification_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = non_empty("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        Self {
            bind_addr: non_empty("HOOPS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            editor_password: non_empty("HOOPS_EDITOR_PASSWORD"),
            session_expiration_days: parsed(&non_empty, "SESSION_EXPIRATION_DAYS")
                .unwrap_or(DEFAULT_SESSION_DAYS),
            notification_capacity: parsed(&non_empty, "HOOPS_NOTIFICATION_CAPACITY")
                .unwrap_or(DEFAULT_NOTIFICATION_CAPACITY),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}
