// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership directory (spreadsheet API) configuration section.

use std::time::Duration;

use dojo_common_config::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Directory configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfigLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub max_attempts: Option<u32>,
	/// Only ever loaded from the environment.
	#[serde(skip)]
	pub api_token: Option<SecretString>,
}

impl DirectoryConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.max_attempts.is_some() {
			self.max_attempts = other.max_attempts;
		}
		if other.api_token.is_some() {
			self.api_token = other.api_token;
		}
	}

	/// Returns `None` when no base URL is configured.
	pub fn finalize(self) -> Result<Option<DirectoryConfig>, ConfigError> {
		let Some(raw) = self.base_url else {
			return Ok(None);
		};

		let base_url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
			key: "directory.base_url".to_string(),
			message: format!("'{raw}': {e}"),
		})?;

		Ok(Some(DirectoryConfig {
			base_url,
			timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
			max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
			api_token: self.api_token,
		}))
	}
}

/// Directory configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryConfig {
	pub base_url: Url,
	pub timeout_secs: u64,
	pub max_attempts: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub api_token: Option<SecretString>,
}

impl DirectoryConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn finalize_none_without_base_url() {
		let layer = DirectoryConfigLayer {
			timeout_secs: Some(5),
			..Default::default()
		};
		assert!(layer.finalize().unwrap().is_none());
	}

	#[test]
	fn finalize_applies_defaults() {
		let layer = DirectoryConfigLayer {
			base_url: Some("https://sheets.example.com/macros/exec".to_string()),
			..Default::default()
		};
		let config = layer.finalize().unwrap().unwrap();
		assert_eq!(config.base_url.host_str(), Some("sheets.example.com"));
		assert_eq!(config.timeout(), Duration::from_secs(10));
		assert_eq!(config.max_attempts, 3);
		assert!(config.api_token.is_none());
	}

	#[test]
	fn finalize_rejects_unparseable_url() {
		let layer = DirectoryConfigLayer {
			base_url: Some("not a url".to_string()),
			..Default::default()
		};
		let err = layer.finalize().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "directory.base_url"));
	}

	#[test]
	fn merge_overwrites_and_preserves() {
		let mut base = DirectoryConfigLayer {
			base_url: Some("https://old.example.com".to_string()),
			timeout_secs: Some(30),
			..Default::default()
		};
		base.merge(DirectoryConfigLayer {
			base_url: Some("https://new.example.com".to_string()),
			api_token: Some(SecretString::new("t".to_string())),
			..Default::default()
		});
		assert_eq!(base.base_url.as_deref(), Some("https://new.example.com"));
		assert_eq!(base.timeout_secs, Some(30));
		assert!(base.api_token.is_some());
	}

	#[test]
	fn token_is_not_read_from_toml() {
		let layer: DirectoryConfigLayer = toml::from_str(
			r#"
base_url = "https://api.example.com"
api_token = "from-file"
"#,
		)
		.unwrap();
		assert!(layer.api_token.is_none());
	}

	#[test]
	fn token_is_redacted_when_serialized() {
		let config = DirectoryConfigLayer {
			base_url: Some("https://api.example.com".to_string()),
			api_token: Some(SecretString::new("sheet-token".to_string())),
			..Default::default()
		}
		.finalize()
		.unwrap()
		.unwrap();
		let json = serde_json::to_string(&config).unwrap();
		assert!(!json.contains("sheet-token"), "got: {json}");
	}
}
