// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership records from the club directory.
//!
//! The directory is a spreadsheet, so `status` and `permission` arrive as
//! free text typed by whoever maintains the sheet. This module maps the known
//! spellings (the Japanese labels used in the sheet and their ASCII tokens)
//! onto closed enums before any access decision is made:
//!
//! | concept   | label      | token       |
//! |-----------|------------|-------------|
//! | admin     | `管理者`    | `admin`     |
//! | active    | `在籍`      | `active`    |
//! | on leave  | `休会`      | `on_leave`  |
//! | withdrawn | `退会`      | `withdrawn` |
//! | pending   | `承認待ち`   | `pending`   |

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// =============================================================================
// Normalised vocabularies
// =============================================================================

/// Membership status after normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
	Active,
	OnLeave,
	Withdrawn,
	PendingApproval,
	/// A non-empty value the portal does not know. Kept for display.
	Unrecognised(String),
}

impl MembershipStatus {
	/// Normalise a raw sheet value. Blank input means "no status".
	pub fn from_raw(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();
		let status = match trimmed {
			"" => return None,
			"在籍" => Self::Active,
			"休会" => Self::OnLeave,
			"退会" => Self::Withdrawn,
			"承認待ち" => Self::PendingApproval,
			_ => match canonical_token(trimmed).as_str() {
				"active" => Self::Active,
				"on_leave" => Self::OnLeave,
				"withdrawn" => Self::Withdrawn,
				"pending" | "pending_approval" => Self::PendingApproval,
				_ => Self::Unrecognised(trimmed.to_string()),
			},
		};
		Some(status)
	}

	pub fn is_active(&self) -> bool {
		matches!(self, Self::Active)
	}
}

impl fmt::Display for MembershipStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Active => write!(f, "active"),
			Self::OnLeave => write!(f, "on_leave"),
			Self::Withdrawn => write!(f, "withdrawn"),
			Self::PendingApproval => write!(f, "pending_approval"),
			Self::Unrecognised(raw) => write!(f, "unrecognised({raw})"),
		}
	}
}

/// Portal permission after normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
	Admin,
	Standard,
	Unrecognised(String),
}

impl PermissionLevel {
	/// Normalise a raw sheet value. Blank input means "no permission label".
	pub fn from_raw(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();
		let level = match trimmed {
			"" => return None,
			"管理者" => Self::Admin,
			"一般" | "会員" => Self::Standard,
			_ => match canonical_token(trimmed).as_str() {
				"admin" => Self::Admin,
				"member" | "standard" | "user" => Self::Standard,
				_ => Self::Unrecognised(trimmed.to_string()),
			},
		};
		Some(level)
	}

	pub fn is_admin(&self) -> bool {
		matches!(self, Self::Admin)
	}
}

/// Lowercase ASCII, with `-` and spaces folded to `_`.
fn canonical_token(raw: &str) -> String {
	raw
		.chars()
		.map(|c| match c {
			'-' | ' ' => '_',
			c => c.to_ascii_lowercase(),
		})
		.collect()
}

// =============================================================================
// Records
// =============================================================================

/// A membership record exactly as the directory API returns it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMembershipRecord {
	#[serde(default, alias = "id", deserialize_with = "string_or_number")]
	pub record_id: String,
	#[serde(default)]
	pub email: String,
	#[serde(default, deserialize_with = "optional_text")]
	pub status: Option<String>,
	#[serde(default, alias = "permissionLabel", deserialize_with = "optional_text")]
	pub permission: Option<String>,
	#[serde(default, alias = "name", deserialize_with = "optional_text")]
	pub display_name: Option<String>,
	#[serde(default, deserialize_with = "optional_text")]
	pub joined_on: Option<String>,
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// A normalised membership record.
///
/// Owned by the external directory; the portal only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
	pub record_id: String,
	pub email: String,
	pub status: Option<MembershipStatus>,
	pub permission: Option<PermissionLevel>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub joined_on: Option<NaiveDate>,
	/// Remaining sheet columns, untouched.
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub profile: BTreeMap<String, Value>,
}

impl MembershipRecord {
	/// A record with only identifying fields set.
	pub fn new(record_id: impl Into<String>, email: impl Into<String>) -> Self {
		Self {
			record_id: record_id.into(),
			email: email.into(),
			status: None,
			permission: None,
			display_name: None,
			joined_on: None,
			profile: BTreeMap::new(),
		}
	}

	pub fn with_status(mut self, status: MembershipStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn with_permission(mut self, permission: PermissionLevel) -> Self {
		self.permission = Some(permission);
		self
	}

	pub fn is_admin(&self) -> bool {
		self.permission.as_ref().is_some_and(PermissionLevel::is_admin)
	}

	pub fn is_active(&self) -> bool {
		self.status.as_ref().is_some_and(MembershipStatus::is_active)
	}
}

impl From<RawMembershipRecord> for MembershipRecord {
	fn from(raw: RawMembershipRecord) -> Self {
		Self {
			record_id: raw.record_id,
			email: raw.email,
			status: raw.status.as_deref().and_then(MembershipStatus::from_raw),
			permission: raw.permission.as_deref().and_then(PermissionLevel::from_raw),
			display_name: raw.display_name,
			joined_on: raw.joined_on.as_deref().and_then(parse_sheet_date),
			profile: raw.extra,
		}
	}
}

/// Parse the date formats seen in the sheet. Anything else is dropped.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
	let raw = raw.trim();
	["%Y-%m-%d", "%Y/%m/%d"]
		.iter()
		.find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
		.or_else(|| {
			DateTime::parse_from_rfc3339(raw)
				.ok()
				.map(|dt| dt.date_naive())
		})
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::String(s) => s,
		Value::Null => String::new(),
		other => other.to_string(),
	})
}

// Spreadsheet cells come back as strings, numbers, or null.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => None,
		Some(Value::String(s)) => Some(s),
		Some(other) => Some(other.to_string()),
	})
}
