//! Process configuration loaded from the environment.
//!
//! Beyond the durable store and cache locations and the HTTP bind port,
//! nothing here is consumed by the engine itself — auth-introspection
//! settings are accepted for forward compatibility with an outer gateway but
//! never read by this binary.

use std::env;

use once_cell::sync::Lazy;

pub struct AppConfig {
    /// Durable store connection string (Postgres URL when `pg_demo` is on).
    pub durable_store_uri: String,
    /// Reserved; the definition cache is in-process only in this release.
    pub cache_uri: Option<String>,
    pub http_port: u16,
    pub base_url: String,
}

pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    let _ = dotenvy::dotenv();

    let http_port = env::var("FLOWBRIDGE_HTTP_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3003);
    let base_url = env::var("FLOWBRIDGE_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{http_port}"));
    let durable_store_uri = env::var("DATABASE_URL").unwrap_or_else(|_| "memory://".to_string());
    let cache_uri = env::var("FLOWBRIDGE_CACHE_URI").ok();

    AppConfig { durable_store_uri, cache_uri, http_port, base_url }
});
