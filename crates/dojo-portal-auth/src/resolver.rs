// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role resolution: identity + directory + allow-list → access tier.
//!
//! # Precedence
//!
//! ```text
//! no identity            → no session (directory not called)
//! email in allow-list    → Admin      (directory not called)
//! directory error/timeout→ Guest
//! no record              → Guest
//! record, admin label    → Admin
//! record, active status  → Member
//! any other record       → PendingApproval
//! ```
//!
//! The allow-list is checked before any network call so that configured
//! administrators keep access while the directory is down.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::allow_list::AdminAllowList;
use crate::directory::{DirectoryError, DirectoryLookup};
use crate::membership::MembershipRecord;
use crate::types::{AccessTier, Identity};

/// Default upper bound on a single directory lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// The outcome of resolving a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSession {
	pub identity: Identity,
	pub tier: AccessTier,
	/// Present if and only if the directory returned a record.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub membership_record: Option<MembershipRecord>,
}

impl ResolvedSession {
	/// A session with no directory record, used when resolution could not
	/// complete.
	pub(crate) fn guest(identity: Identity) -> Self {
		Self {
			identity,
			tier: AccessTier::Guest,
			membership_record: None,
		}
	}

	pub fn email(&self) -> &str {
		&self.identity.email
	}
}

/// Derive the tier from an already-fetched directory result.
///
/// This is the part of resolution that does not depend on the allow-list or
/// on the network.
pub fn tier_for_record(record: Option<&MembershipRecord>) -> AccessTier {
	match record {
		None => AccessTier::Guest,
		Some(record) if record.is_admin() => AccessTier::Admin,
		Some(record) if record.is_active() => AccessTier::Member,
		// Covers records without status and permission too: the record exists,
		// so a registration was attempted.
		Some(_) => AccessTier::PendingApproval,
	}
}

/// Computes [`ResolvedSession`]s. Holds no per-user state.
pub struct RoleResolver<D> {
	directory: D,
	allow_list: AdminAllowList,
	lookup_timeout: Duration,
}

impl<D: DirectoryLookup> RoleResolver<D> {
	pub fn new(directory: D, allow_list: AdminAllowList) -> Self {
		Self {
			directory,
			allow_list,
			lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
		}
	}

	pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
		self.lookup_timeout = timeout;
		self
	}

	/// Resolve the session for `identity`.
	///
	/// Never fails: directory errors and timeouts degrade to [`AccessTier::Guest`].
	#[instrument(level = "debug", skip_all, fields(email = identity.map(|i| i.email.as_str())))]
	pub async fn resolve(&self, identity: Option<&Identity>) -> Option<ResolvedSession> {
		let identity = identity?;

		if self.allow_list.contains(&identity.email) {
			debug!("email is on the admin allow-list");
			return Some(ResolvedSession {
				identity: identity.clone(),
				tier: AccessTier::Admin,
				membership_record: None,
			});
		}

		let record = match self.lookup(&identity.email).await {
			Ok(record) => record,
			Err(err) => {
				warn!(error = %err, "directory lookup failed, resolving as guest");
				None
			}
		};

		let tier = tier_for_record(record.as_ref());
		debug!(%tier, has_record = record.is_some(), "resolved access tier");

		Some(ResolvedSession {
			identity: identity.clone(),
			tier,
			membership_record: record,
		})
	}

	async fn lookup(&self, email: &str) -> Result<Option<MembershipRecord>, DirectoryError> {
		tokio::time::timeout(self.lookup_timeout, self.directory.find_by_email(email))
			.await
			.map_err(|_| DirectoryError::Timeout)?
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::membership::{MembershipStatus, PermissionLevel};
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	enum Behaviour {
		Returns(Option<MembershipRecord>),
		Fails,
		Hangs,
	}

	struct MockDirectory {
		behaviour: Behaviour,
		calls: Arc<AtomicU32>,
	}

	impl MockDirectory {
		fn new(behaviour: Behaviour) -> (Self, Arc<AtomicU32>) {
			let calls = Arc::new(AtomicU32::new(0));
			(
				Self {
					behaviour,
					calls: Arc::clone(&calls),
				},
				calls,
			)
		}
	}

	#[async_trait]
	impl DirectoryLookup for MockDirectory {
		async fn find_by_email(
			&self,
			_email: &str,
		) -> Result<Option<MembershipRecord>, DirectoryError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			match &self.behaviour {
				Behaviour::Returns(record) => Ok(record.clone()),
				Behaviour::Fails => Err(DirectoryError::Server {
					status: reqwest::StatusCode::BAD_GATEWAY,
					message: "sheet unavailable".to_string(),
				}),
				Behaviour::Hangs => {
					tokio::time::sleep(Duration::from_secs(60)).await;
					Ok(None)
				}
			}
		}
	}

	fn identity(email: &str) -> Identity {
		Identity::new("uid", email, "Test User")
	}

	fn record(status: &str, permission: &str) -> MembershipRecord {
		let mut record = MembershipRecord::new("r-1", "p@club.org");
		record.status = MembershipStatus::from_raw(status);
		record.permission = PermissionLevel::from_raw(permission);
		record
	}

	fn resolver(behaviour: Behaviour, admins: &[&str]) -> (RoleResolver<MockDirectory>, Arc<AtomicU32>) {
		let (directory, calls) = MockDirectory::new(behaviour);
		let resolver = RoleResolver::new(directory, AdminAllowList::new(admins.iter().copied()))
			.with_lookup_timeout(Duration::from_millis(50));
		(resolver, calls)
	}

	#[tokio::test]
	async fn no_identity_means_no_session_and_no_lookup() {
		let (resolver, calls) = resolver(Behaviour::Returns(None), &[]);
		assert!(resolver.resolve(None).await.is_none());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn allow_listed_admin_skips_the_directory() {
		let (resolver, calls) = resolver(Behaviour::Fails, &["admin@club.org"]);
		let session = resolver.resolve(Some(&identity("admin@club.org"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::Admin);
		assert!(session.membership_record.is_none());
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn allow_list_is_case_sensitive() {
		let (resolver, calls) = resolver(Behaviour::Returns(None), &["admin@club.org"]);
		let session = resolver.resolve(Some(&identity("Admin@club.org"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::Guest);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn unknown_email_is_guest() {
		let (resolver, _) = resolver(Behaviour::Returns(None), &[]);
		let session = resolver.resolve(Some(&identity("new@person.com"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::Guest);
		assert!(session.membership_record.is_none());
	}

	#[tokio::test]
	async fn active_record_is_member() {
		let (resolver, _) = resolver(Behaviour::Returns(Some(record("active", ""))), &[]);
		let session = resolver.resolve(Some(&identity("p@club.org"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::Member);
		assert!(session.membership_record.is_some());
	}

	#[tokio::test]
	async fn withdrawn_record_is_pending_approval() {
		let (resolver, _) = resolver(Behaviour::Returns(Some(record("withdrawn", ""))), &[]);
		let session = resolver.resolve(Some(&identity("p@club.org"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::PendingApproval);
		assert!(session.membership_record.is_some());
	}

	#[tokio::test]
	async fn admin_label_wins_over_status() {
		let (first, _) = resolver(Behaviour::Returns(Some(record("active", "admin"))), &[]);
		let session = first.resolve(Some(&identity("p@club.org"))).await.unwrap();
		assert_eq!(session.tier, AccessTier::Admin);

		let (resolver, _) = resolver(Behaviour::Returns(Some(record("退会", "管理者"))), &[]);
		let session = resolver.resolve(Some(&identity("p@club.org"))).await.unwrap();
		assert_eq!(session.tier, AccessTier::Admin);
		assert!(session.membership_record.is_some());
	}

	#[tokio::test]
	async fn directory_failure_is_guest() {
		let (resolver, calls) = resolver(Behaviour::Fails, &[]);
		let session = resolver.resolve(Some(&identity("x@x.com"))).await.unwrap();

		assert_eq!(session.tier, AccessTier::Guest);
		assert!(session.membership_record.is_none());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn directory_timeout_is_guest() {
		let (resolver, _) = resolver(Behaviour::Hangs, &[]);
		let session = resolver.resolve(Some(&identity("slow@club.org"))).await.unwrap();
		assert_eq!(session.tier, AccessTier::Guest);
	}

	#[tokio::test]
	async fn allow_listed_admin_is_admin_even_when_directory_hangs() {
		let (resolver, _) = resolver(Behaviour::Hangs, &["admin@club.org"]);
		let session = tokio::time::timeout(
			Duration::from_millis(20),
			resolver.resolve(Some(&identity("admin@club.org"))),
		)
		.await
		.expect("allow-listed admin must not wait for the directory")
		.unwrap();
		assert_eq!(session.tier, AccessTier::Admin);
	}

	#[tokio::test]
	async fn resolution_is_idempotent() {
		let (resolver, _) = resolver(Behaviour::Returns(Some(record("在籍", "一般"))), &[]);
		let who = identity("p@club.org");

		let first = resolver.resolve(Some(&who)).await;
		let second = resolver.resolve(Some(&who)).await;
		assert_eq!(first, second);
	}

	#[test]
	fn tier_for_record_covers_every_branch() {
		assert_eq!(tier_for_record(None), AccessTier::Guest);
		assert_eq!(tier_for_record(Some(&record("", ""))), AccessTier::PendingApproval);
		assert_eq!(tier_for_record(Some(&record("休会", ""))), AccessTier::PendingApproval);
		assert_eq!(tier_for_record(Some(&record("trial", "user"))), AccessTier::PendingApproval);
		assert_eq!(tier_for_record(Some(&record("在籍", ""))), AccessTier::Member);
		assert_eq!(tier_for_record(Some(&record("", "管理者"))), AccessTier::Admin);
	}

	#[test]
	fn admin_permission_outranks_inactive_status() {
		let record = MembershipRecord::new("r-2", "sensei@club.org")
			.with_status(MembershipStatus::OnLeave)
			.with_permission(PermissionLevel::Admin);
		assert_eq!(tier_for_record(Some(&record)), AccessTier::Admin);

		let record = record.with_permission(PermissionLevel::Standard);
		assert_eq!(tier_for_record(Some(&record)), AccessTier::PendingApproval);
	}

	#[test]
	fn session_serializes_without_missing_record() {
		let session = ResolvedSession {
			identity: identity("admin@club.org"),
			tier: AccessTier::Admin,
			membership_record: None,
		};
		let json = serde_json::to_string(&session).unwrap();
		assert!(json.contains("\"tier\":\"admin\""), "got: {json}");
		assert!(!json.contains("membershipRecord"), "got: {json}");
	}
}
