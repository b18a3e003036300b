// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup; everything about roles, permissions and quotas lives in the
//! policy document instead.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `CONTAINER_CONFIG` | Path of the policy document | `container.config.json` |
//! | `STORAGE_ROOT` | Root directory of stored files | `DO_NOT_DELETE/container` |
//! | `ADMIN_KEY` | Shared secret required to issue tokens | `admin123` (warns) |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | policy `port`, then `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use crate::auth::DEFAULT_ADMIN_KEY;
use crate::policy::store::DEFAULT_POLICY_PATH;
use crate::storage::paths::DEFAULT_STORAGE_ROOT;

/// Environment variable name for the policy document path.
pub const CONTAINER_CONFIG_ENV: &str = "CONTAINER_CONFIG";

/// Environment variable name for the storage root.
pub const STORAGE_ROOT_ENV: &str = "STORAGE_ROOT";

/// Environment variable name for the token-issuance secret.
pub const ADMIN_KEY_ENV: &str = "ADMIN_KEY";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port used when neither `PORT` nor the policy's `port` is set.
pub const DEFAULT_PORT: u16 = 8080;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Process settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub policy_path: PathBuf,
    pub storage_root: PathBuf,
    pub admin_key: String,
    /// True when `ADMIN_KEY` was not set and the built-in key is in use.
    pub admin_key_is_default: bool,
    pub host: String,
    /// Explicit `PORT`; `None` defers to the policy document.
    pub port: Option<u16>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let admin_key = lookup(ADMIN_KEY_ENV).filter(|k| !k.is_empty());

        Self {
            policy_path: lookup(CONTAINER_CONFIG_ENV)
                .unwrap_or_else(|| DEFAULT_POLICY_PATH.to_string())
                .into(),
            storage_root: lookup(STORAGE_ROOT_ENV)
                .unwrap_or_else(|| DEFAULT_STORAGE_ROOT.to_string())
                .into(),
            admin_key_is_default: admin_key.is_none(),
            admin_key: admin_key.unwrap_or_else(|| DEFAULT_ADMIN_KEY.to_string()),
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup(PORT_ENV).and_then(|p| p.parse().ok()),
            log_format: lookup(LOG_FORMAT_ENV)
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
        }
    }

    /// Bind port: `PORT`, then the policy's `port`, then 8080.
    pub fn bind_port(&self, policy_port: Option<u16>) -> u16 {
        self.port.or(policy_port).unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config(&[]);
        assert_eq!(config.policy_path, PathBuf::from("container.config.json"));
        assert_eq!(config.storage_root, PathBuf::from("DO_NOT_DELETE/container"));
        assert_eq!(config.admin_key, "admin123");
        assert!(config.admin_key_is_default);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("CONTAINER_CONFIG", "/etc/box.json"),
            ("ADMIN_KEY", "hunter2"),
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.policy_path, PathBuf::from("/etc/box.json"));
        assert_eq!(config.admin_key, "hunter2");
        assert!(!config.admin_key_is_default);
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_admin_key_falls_back_to_default() {
        let config = config(&[("ADMIN_KEY", "")]);
        assert!(config.admin_key_is_default);
    }

    #[test]
    fn bind_port_precedence() {
        assert_eq!(config(&[("PORT", "9000")]).bind_port(Some(7000)), 9000);
        assert_eq!(config(&[]).bind_port(Some(7000)), 7000);
        assert_eq!(config(&[("PORT", "nope")]).bind_port(None), 8080);
    }
}
