//! Locating the tag service
//!
//! FlexLogger only talks to the SystemLink web server on the same machine, so
//! the connection normally comes from the localhost HTTP configuration that
//! SystemLink installs. An explicit server URL overrides it.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::utils::paths::localhost_http_configuration_path;

const NO_LOCAL_SERVICE: &str =
    "FlexLogger requires a local NI SystemLink install and the NI Web Server running on localhost";

#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("{} (no HTTP configuration at {})", NO_LOCAL_SERVICE, path.display())]
    NoLocalService { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid server URL \"{url}\"")]
    InvalidUrl { url: String },

    #[error("{} ({url} is not a local address)", NO_LOCAL_SERVICE)]
    NotLocal { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Locality {
    /// Only loopback hosts are accepted
    LocalOnly,
    #[cfg(test)]
    Any,
}

/// Inputs for connection resolution, highest priority first
#[derive(Debug, Clone, Default)]
pub(crate) struct ConnectionSettings {
    pub(crate) server_url: Option<String>,
    pub(crate) api_key: Option<String>,
    /// Overrides the SystemLink localhost configuration path
    pub(crate) http_configuration: Option<PathBuf>,
    pub(crate) request_timeout: Option<Duration>,
}

/// The shape of SystemLink's `HttpConfigurations/*.json` files
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HttpConfigurationFile {
    uri: String,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Connection {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) request_timeout: Duration,
}

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl Connection {
    pub(crate) fn resolve(
        settings: &ConnectionSettings,
        locality: Locality,
    ) -> Result<Self, ConnectionError> {
        let (url, file_key) = match &settings.server_url {
            Some(url) => (url.clone(), None),
            None => {
                let path = settings
                    .http_configuration
                    .clone()
                    .unwrap_or_else(localhost_http_configuration_path);
                let file = read_http_configuration(&path)?;
                tracing::debug!(path = %path.display(), "using SystemLink HTTP configuration");
                (file.uri, file.api_key)
            }
        };

        let base_url = url.trim().trim_end_matches('/').to_string();
        if locality == Locality::LocalOnly && !is_local_url(&base_url)? {
            return Err(ConnectionError::NotLocal { url: base_url });
        }

        Ok(Self {
            base_url,
            api_key: settings.api_key.clone().or(file_key).filter(|k| !k.is_empty()),
            request_timeout: settings.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }
}

fn read_http_configuration(path: &Path) -> Result<HttpConfigurationFile, ConnectionError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConnectionError::NoLocalService {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ConnectionError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    // SystemLink writes these files with a byte order mark on Windows
    let content = content.trim_start_matches('\u{feff}');
    serde_json::from_str(content).map_err(|e| ConnectionError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn is_local_url(url: &str) -> Result<bool, ConnectionError> {
    let invalid = || ConnectionError::InvalidUrl {
        url: url.to_string(),
    };
    let uri: ureq::http::Uri = url.parse().map_err(|_| invalid())?;
    let host = uri.host().ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(true);
    }
    Ok(host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_file(path: &Path) -> ConnectionSettings {
        ConnectionSettings {
            http_configuration: Some(path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn reads_localhost_configuration_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("http_localhost.json");
        std::fs::write(
            &path,
            "\u{feff}{\"Uri\": \"http://localhost:9090/\", \"ApiKey\": \"secret\"}",
        )
        .unwrap();

        let conn = Connection::resolve(&settings_with_file(&path), Locality::LocalOnly).unwrap();
        assert_eq!(conn.base_url, "http://localhost:9090");
        assert_eq!(conn.api_key.as_deref(), Some("secret"));
        assert_eq!(conn.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn missing_configuration_is_a_remediation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Connection::resolve(&settings_with_file(&path), Locality::LocalOnly).unwrap_err();
        assert!(matches!(err, ConnectionError::NoLocalService { .. }));
        assert!(err.to_string().starts_with(NO_LOCAL_SERVICE));
    }

    #[test]
    fn malformed_configuration_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("http_localhost.json");
        std::fs::write(&path, "{\"Url\": 1}").unwrap();
        let err = Connection::resolve(&settings_with_file(&path), Locality::LocalOnly).unwrap_err();
        assert!(matches!(err, ConnectionError::Parse { .. }));
    }

    #[test]
    fn explicit_url_and_key_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("http_localhost.json");
        std::fs::write(&path, r#"{"Uri": "http://localhost:9090", "ApiKey": "file"}"#).unwrap();
        let settings = ConnectionSettings {
            server_url: Some("http://127.0.0.1:8080".to_string()),
            api_key: Some("flag".to_string()),
            http_configuration: Some(path),
            request_timeout: Some(Duration::from_secs(3)),
        };
        let conn = Connection::resolve(&settings, Locality::LocalOnly).unwrap();
        assert_eq!(conn.base_url, "http://127.0.0.1:8080");
        assert_eq!(conn.api_key.as_deref(), Some("flag"));
        assert_eq!(conn.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn remote_hosts_are_rejected_when_local_only() {
        let settings = ConnectionSettings {
            server_url: Some("https://systemlink.example.com".to_string()),
            ..Default::default()
        };
        let err = Connection::resolve(&settings, Locality::LocalOnly).unwrap_err();
        assert!(matches!(err, ConnectionError::NotLocal { .. }));
        assert!(Connection::resolve(&settings, Locality::Any).is_ok());
    }

    #[test]
    fn loopback_addresses_are_local() {
        assert!(is_local_url("http://localhost").unwrap());
        assert!(is_local_url("http://127.0.0.1:9090").unwrap());
        assert!(is_local_url("http://[::1]:9090").unwrap());
        assert!(!is_local_url("http://10.0.0.4").unwrap());
    }

    #[test]
    fn garbage_url_is_invalid() {
        assert!(matches!(
            is_local_url("not a url"),
            Err(ConnectionError::InvalidUrl { .. })
        ));
    }
}
