//! HTTP server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Front-end origin allowed by CORS in production
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    /// Multipart upload limits
    #[serde(default)]
    pub uploads: UploadConfig,
}

/// Multipart upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest accepted file in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Most files accepted in one request
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Largest accepted non-file field (the encoded operation) in bytes
    #[serde(default = "default_max_field_size")]
    pub max_field_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            frontend_url: default_frontend_url(),
            body_limit_bytes: default_body_limit_bytes(),
            uploads: UploadConfig::default(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            max_field_size: default_max_field_size(),
        }
    }
}

impl ServerConfig {
    /// `bind_address:port`, with IPv6 addresses bracketed
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;
        validate_positive(self.port, "port", self.domain_name())?;
        validate_url(&self.frontend_url, "frontend_url", self.domain_name())?;
        validate_positive(self.body_limit_bytes, "body_limit_bytes", self.domain_name())?;
        self.uploads.validate()?;

        if self.uploads.max_file_size > self.body_limit_bytes {
            return Err(self.validation_error(format!(
                "uploads.max_file_size ({}) cannot exceed body_limit_bytes ({})",
                self.uploads.max_file_size, self.body_limit_bytes
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

impl Validatable for UploadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_file_size, "max_file_size", self.domain_name())?;
        validate_positive(self.max_files, "max_files", self.domain_name())?;
        validate_positive(self.max_field_size, "max_field_size", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server.uploads"
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_body_limit_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_max_file_size() -> usize {
    20 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_max_field_size() -> usize {
    1024 * 1024
}
