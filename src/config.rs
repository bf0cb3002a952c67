use std::{env, net::SocketAddr, path::PathBuf};

use url::Url;

use crate::error::AppError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: Url,
    pub listen_addr: SocketAddr,
    pub static_root: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let api_base = parse_api_base(
            &env::var("TRIP_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        )?;

        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let static_root = env::var("STATIC_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static"));

        Ok(Self {
            api_base,
            listen_addr,
            static_root,
        })
    }
}

pub fn parse_api_base(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| AppError::Config(format!("invalid TRIP_API_BASE: {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "TRIP_API_BASE must be an http(s) url, got {url}"
        )));
    }
    Ok(url)
}
