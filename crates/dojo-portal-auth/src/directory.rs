// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory lookup: "find membership record by email".
//!
//! The directory is the spreadsheet-backed club API. Only the single read the
//! portal's access decision needs is modelled here:
//!
//! ```text
//! GET {base_url}/members/lookup?email=<email>
//!   200 {"member": {...}}  → record
//!   200 {"member": null}   → not found
//!   404                    → not found
//!   anything else          → DirectoryError
//! ```

use async_trait::async_trait;
use dojo_common_config::SecretString;
use dojo_common_http::{RetryConfig, RetryableError};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::membership::{MembershipRecord, RawMembershipRecord};

/// Errors from the directory. The role resolver treats all of them as
/// "no record".
#[derive(Debug, Error)]
pub enum DirectoryError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("directory returned {status}: {message}")]
	Server { status: StatusCode, message: String },

	#[error("malformed directory response: {0}")]
	Malformed(String),

	#[error("invalid directory URL: {0}")]
	InvalidUrl(String),

	#[error("directory lookup timed out")]
	Timeout,
}

impl RetryableError for DirectoryError {
	fn is_retryable(&self) -> bool {
		match self {
			Self::Network(e) => e.is_retryable(),
			Self::Server { status, .. } => status.is_retryable(),
			Self::Malformed(_) | Self::InvalidUrl(_) => false,
			Self::Timeout => true,
		}
	}
}

/// Read access to the club directory.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
	async fn find_by_email(&self, email: &str) -> Result<Option<MembershipRecord>, DirectoryError>;
}

#[async_trait]
impl<T: DirectoryLookup + ?Sized> DirectoryLookup for std::sync::Arc<T> {
	async fn find_by_email(&self, email: &str) -> Result<Option<MembershipRecord>, DirectoryError> {
		(**self).find_by_email(email).await
	}
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
	#[serde(default)]
	member: Option<RawMembershipRecord>,
}

/// HTTP client for the spreadsheet-backed directory API.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
	base_url: Url,
	http: reqwest::Client,
	retry_config: RetryConfig,
	api_token: Option<SecretString>,
}

impl HttpDirectory {
	pub fn new(base_url: Url, http: reqwest::Client) -> Self {
		Self {
			base_url,
			http,
			retry_config: RetryConfig::default(),
			api_token: None,
		}
	}

	pub fn with_api_token(mut self, token: SecretString) -> Self {
		self.api_token = Some(token);
		self
	}

	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	fn lookup_url(&self, email: &str) -> Result<Url, DirectoryError> {
		// `join` would drop the last path segment of a base without a trailing slash.
		let mut base = self.base_url.clone();
		if !base.path().ends_with('/') {
			base.set_path(&format!("{}/", base.path()));
		}
		let mut url = base
			.join("members/lookup")
			.map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
		url.query_pairs_mut().append_pair("email", email);
		Ok(url)
	}

	fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.api_token {
			Some(token) => req.bearer_auth(token.expose()),
			None => req,
		}
	}

	async fn fetch_once(&self, url: &Url) -> Result<Option<MembershipRecord>, DirectoryError> {
		let response = self.apply_auth(self.http.get(url.clone())).send().await?;

		match response.status() {
			StatusCode::OK => {
				let body = response.text().await?;
				let parsed: LookupResponse = serde_json::from_str(&body)
					.map_err(|e| DirectoryError::Malformed(e.to_string()))?;
				Ok(parsed.member.map(MembershipRecord::from))
			}
			StatusCode::NOT_FOUND => Ok(None),
			status => {
				let message = response.text().await.unwrap_or_default();
				Err(DirectoryError::Server { status, message })
			}
		}
	}
}

#[async_trait]
impl DirectoryLookup for HttpDirectory {
	async fn find_by_email(&self, email: &str) -> Result<Option<MembershipRecord>, DirectoryError> {
		let url = self.lookup_url(email)?;
		debug!(email, url = %url, "looking up membership record");

		let record =
			dojo_common_http::retry(&self.retry_config, || self.fetch_once(&url)).await?;

		debug!(email, found = record.is_some(), "membership lookup finished");
		Ok(record)
	}
}
