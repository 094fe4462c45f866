//! Verifier and issuance settings loaded from the environment.
//!
//! | Variable                           | Default | Meaning                                   |
//! |------------------------------------|---------|-------------------------------------------|
//! | `CERTCHAIN_RANK_CEILING`           | `100`   | Highest rank accepted at any link         |
//! | `CERTCHAIN_MAX_CHAIN_DEPTH`        | unset   | Longest chain walked before rejecting     |
//! | `CERTCHAIN_REQUIRE_ISSUER_LINKAGE` | `false` | Issuer must be the parent's subject       |
//! | `CERTCHAIN_TRUSTED_ROOTS_PATH`     | unset   | PEM bundle of accepted root issuer keys   |
//! | `CERTCHAIN_DEFAULT_TTL`            | `3600`  | Validity for newly issued certificates    |

use crate::chain::builder::DEFAULT_VALIDITY_SECONDS;
use crate::modules::crypto::parse_pem_public_keys;
use p256::PublicKey;
use std::env;
use thiserror::Error;

pub const DEFAULT_RANK_CEILING: i64 = 100;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    #[error("Failed to load trusted roots from {path}: {reason}")]
    TrustedRoots { path: String, reason: String },
}

/// Everything read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub verifier: VerifierSettings,
    pub issuance: IssuanceSettings,
}

/// Policy applied by [`ChainValidator`](crate::chain::ChainValidator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierSettings {
    /// Highest rank accepted at any link (inclusive).
    pub rank_ceiling: i64,

    /// Longest chain walked; longer chains are rejected. `None` walks any length.
    pub max_chain_depth: Option<usize>,

    /// Require each certificate's issuer to be its parent's subject.
    pub require_issuer_linkage: bool,

    /// Accepted root issuers. Empty accepts any root.
    pub trusted_roots: Vec<PublicKey>,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            rank_ceiling: DEFAULT_RANK_CEILING,
            max_chain_depth: None,
            require_issuer_linkage: false,
            trusted_roots: Vec::new(),
        }
    }
}

/// Defaults for newly issued certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceSettings {
    pub default_ttl_seconds: i64,
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_VALIDITY_SECONDS,
        }
    }
}

/// Load settings from process environment variables.
pub fn load_settings() -> Result<Settings, ConfigError> {
    settings_from_lookup(|name| env::var(name).ok())
}

/// Load settings through an arbitrary variable lookup.
pub fn settings_from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Settings::default();

    let trusted_roots = match lookup("CERTCHAIN_TRUSTED_ROOTS_PATH") {
        Some(path) => load_trusted_roots(&path)?,
        None => defaults.verifier.trusted_roots,
    };
    let max_chain_depth = match lookup("CERTCHAIN_MAX_CHAIN_DEPTH") {
        Some(value) => Some(parse_value("CERTCHAIN_MAX_CHAIN_DEPTH", value)?),
        None => defaults.verifier.max_chain_depth,
    };

    Ok(Settings {
        verifier: VerifierSettings {
            rank_ceiling: parse_var(
                &lookup,
                "CERTCHAIN_RANK_CEILING",
                defaults.verifier.rank_ceiling,
            )?,
            max_chain_depth,
            require_issuer_linkage: parse_var(
                &lookup,
                "CERTCHAIN_REQUIRE_ISSUER_LINKAGE",
                defaults.verifier.require_issuer_linkage,
            )?,
            trusted_roots,
        },
        issuance: IssuanceSettings {
            default_ttl_seconds: parse_var(
                &lookup,
                "CERTCHAIN_DEFAULT_TTL",
                defaults.issuance.default_ttl_seconds,
            )?,
        },
    })
}

/// Read every `PUBLIC KEY` block from a PEM bundle file.
pub fn load_trusted_roots(path: &str) -> Result<Vec<PublicKey>, ConfigError> {
    let bundle = std::fs::read_to_string(path).map_err(|e| ConfigError::TrustedRoots {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let roots = parse_pem_public_keys(&bundle).map_err(|e| ConfigError::TrustedRoots {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    if roots.is_empty() {
        return Err(ConfigError::TrustedRoots {
            path: path.to_string(),
            reason: "no PUBLIC KEY blocks found".to_string(),
        });
    }
    Ok(roots)
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => parse_value(name, value),
        None => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value,
    })
}
