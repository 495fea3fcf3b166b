// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for the portal's identity and access model.
//!
//! - [`SubjectId`]: the identity provider's opaque, stable user id
//! - [`Identity`]: who is signed in, as reported by the identity provider
//! - [`AccessTier`]: the derived capability tier that gates portal screens

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identity
// =============================================================================

/// Opaque, stable subject identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SubjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SubjectId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for SubjectId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// A signed-in identity.
///
/// Immutable for the lifetime of a sign-in; a new value is emitted by the
/// identity provider whenever the signed-in user changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
	pub subject_id: SubjectId,
	pub email: String,
	pub display_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
}

impl Identity {
	pub fn new(
		subject_id: impl Into<SubjectId>,
		email: impl Into<String>,
		display_name: impl Into<String>,
	) -> Self {
		Self {
			subject_id: subject_id.into(),
			email: email.into(),
			display_name: display_name.into(),
			avatar_url: None,
		}
	}

	pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
		self.avatar_url = Some(url.into());
		self
	}
}

// =============================================================================
// Access Tier
// =============================================================================

/// Capability tier of a signed-in visitor.
///
/// Variants are declared from least to most privileged, so the derived
/// ordering doubles as the privilege ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
	/// Signed in, but the directory has no record for this email.
	Guest,
	/// A record exists but is not (yet, or any longer) active.
	PendingApproval,
	/// Active club member.
	Member,
	/// Club administrator.
	Admin,
}

impl AccessTier {
	/// Returns all tiers, least privileged first.
	pub fn all() -> &'static [AccessTier] {
		&[
			AccessTier::Guest,
			AccessTier::PendingApproval,
			AccessTier::Member,
			AccessTier::Admin,
		]
	}

	/// Returns true if this tier has at least the permissions of `other`.
	pub fn has_permission_of(&self, other: &AccessTier) -> bool {
		self >= other
	}

	pub fn is_admin(&self) -> bool {
		matches!(self, AccessTier::Admin)
	}
}

impl fmt::Display for AccessTier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessTier::Guest => write!(f, "guest"),
			AccessTier::PendingApproval => write!(f, "pending_approval"),
			AccessTier::Member => write!(f, "member"),
			AccessTier::Admin => write!(f, "admin"),
		}
	}
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown access tier: {0}")]
pub struct UnknownTier(pub String);

impl std::str::FromStr for AccessTier {
	type Err = UnknownTier;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"guest" => Ok(AccessTier::Guest),
			"pending_approval" | "pending" => Ok(AccessTier::PendingApproval),
			"member" => Ok(AccessTier::Member),
			"admin" => Ok(AccessTier::Admin),
			_ => Err(UnknownTier(s.to_string())),
		}
	}
}
