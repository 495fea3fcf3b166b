// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration: the static admin allow-list.

use serde::{Deserialize, Serialize};

/// Authorization configuration (runtime, fully resolved).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthConfig {
	/// Emails always granted the admin tier. Compared case-sensitively.
	pub admin_emails: Vec<String>,
}

/// Authorization configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub admin_emails: Option<Vec<String>>,
}

impl AuthConfigLayer {
	/// A later allow-list replaces an earlier one rather than extending it.
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.admin_emails.is_some() {
			self.admin_emails = other.admin_emails;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			admin_emails: self.admin_emails.unwrap_or_default(),
		}
	}
}
