//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use taleroom_narrator::{NarratorConfig, OpenAiNarrator};
use taleroom_narrator::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use tower_http::cors::CorsLayer;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Single origin allowed by CORS. `None` means permissive.
    pub cors_allowed_origin: Option<String>,
    /// Narrator backend settings.
    pub narrator: NarratorConfig,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };

        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config("OPENAI_API_KEY environment variable must be set".into())
            })?;
        let timeout = match lookup("NARRATOR_TIMEOUT_SECS") {
            Some(secs) => secs.parse().map(Duration::from_secs).map_err(|e| {
                AppError::Config(format!("NARRATOR_TIMEOUT_SECS must be whole seconds: {e}"))
            })?,
            None => DEFAULT_TIMEOUT,
        };
        if timeout.is_zero() {
            return Err(AppError::Config(
                "NARRATOR_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }
        let narrator = NarratorConfig::new(api_key)
            .with_model(lookup("NARRATOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()))
            .with_base_url(
                lookup("NARRATOR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )
            .with_timeout(timeout);

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN").filter(|o| !o.trim().is_empty());

        Ok(Self {
            host,
            port,
            cors_allowed_origin,
            narrator,
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form a socket
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Builds the narrator client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Narrator` if the client cannot be built.
    pub fn narrator_client(&self) -> Result<OpenAiNarrator, AppError> {
        Ok(OpenAiNarrator::new(self.narrator.clone())?)
    }

    /// CORS middleware: restricted to `cors_allowed_origin` when set,
    /// permissive otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the origin is not a valid header value.
    pub fn cors_layer(&self) -> Result<CorsLayer, AppError> {
        let Some(origin) = &self.cors_allowed_origin else {
            return Ok(CorsLayer::permissive());
        };
        let origin = HeaderValue::from_str(origin).map_err(|e| {
            AppError::Config(format!("CORS_ALLOWED_ORIGIN is not a valid origin: {e}"))
        })?;
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]))
    }
}
