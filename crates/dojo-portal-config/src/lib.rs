// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the dojo member portal.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`DOJO_PORTAL_*`)
//!
//! # Usage
//!
//! ```ignore
//! use dojo_portal_config::load_config;
//!
//! let config = load_config()?;
//! println!("admins: {}", config.auth.admin_emails.len());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PortalConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use serde::Serialize;
use tracing::{debug, info};

/// Fully resolved portal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortalConfig {
	/// `None` when no directory base URL is configured.
	pub directory: Option<DirectoryConfig>,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`DOJO_PORTAL_*`)
/// 2. Config file (`/etc/dojo-portal/portal.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<PortalConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<PortalConfig, ConfigError> {
	let mut merged = PortalConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<PortalConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PortalConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: PortalConfigLayer) -> Result<PortalConfig, ConfigError> {
	let directory = layer.directory.unwrap_or_default().finalize()?;
	let auth = layer.auth.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(directory.as_ref(), &auth)?;

	info!(
		directory = directory.as_ref().map(|d| d.base_url.as_str()),
		directory_token = directory.as_ref().is_some_and(|d| d.api_token.is_some()),
		admin_emails = auth.admin_emails.len(),
		log_format = %logging.format,
		"Portal configuration loaded"
	);

	Ok(PortalConfig {
		directory,
		auth,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(directory: Option<&DirectoryConfig>, auth: &AuthConfig) -> Result<(), ConfigError> {
	if let Some(directory) = directory {
		if !matches!(directory.base_url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"directory.base_url must be an http(s) URL, got '{}'",
				directory.base_url
			)));
		}
		if directory.timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"directory.timeout_secs must be greater than zero".to_string(),
			));
		}
		if directory.max_attempts == 0 {
			return Err(ConfigError::Validation(
				"directory.max_attempts must be at least 1".to_string(),
			));
		}
	}

	for email in &auth.admin_emails {
		if !is_plausible_email(email) {
			return Err(ConfigError::Validation(format!(
				"auth.admin_emails contains an invalid entry '{email}'"
			)));
		}
	}

	Ok(())
}

// Allow-list matching is exact, so surrounding whitespace would never match.
fn is_plausible_email(email: &str) -> bool {
	!email.is_empty() && email.trim() == email && email.contains('@')
}
