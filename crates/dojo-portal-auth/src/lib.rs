// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access-tier resolution for the dojo member portal.
//!
//! Given a signed-in identity, decides which capability tier the visitor has
//! and therefore which portal screens they may see.
//!
//! # Components
//!
//! - **Directory lookup** ([`HttpDirectory`]): fetches a membership record by email
//! - **Role resolver** ([`RoleResolver`]): identity + record + allow-list → tier
//! - **Session holder** ([`SessionHolder`]): re-resolves on every identity change,
//!   latest event wins
//! - **View router** ([`router`]): tier → visible screens and landing screen
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dojo_portal_auth::{AdminAllowList, HttpDirectory, LocalIdentityProvider, RoleResolver, SessionHolder};
//!
//! let directory = HttpDirectory::new(base_url, dojo_common_http::builder().build()?);
//! let resolver = Arc::new(RoleResolver::new(directory, AdminAllowList::new(["admin@club.org"])));
//! let holder = SessionHolder::start(Arc::new(LocalIdentityProvider::new()), resolver);
//!
//! let state = holder.settled().await;
//! ```

pub mod allow_list;
pub mod directory;
pub mod membership;
pub mod provider;
pub mod resolver;
pub mod router;
pub mod session;
pub mod types;

pub use allow_list::AdminAllowList;
pub use directory::{DirectoryError, DirectoryLookup, HttpDirectory};
pub use membership::{MembershipRecord, MembershipStatus, PermissionLevel, RawMembershipRecord};
pub use provider::{
	IdentityEvents, IdentityProvider, LocalIdentityProvider, SignInError, SignInMethod,
	SignInOutcome,
};
pub use resolver::{tier_for_record, ResolvedSession, RoleResolver, DEFAULT_LOOKUP_TIMEOUT};
pub use router::{can_view, landing, route, screens_for, RouteDecision, Screen};
pub use session::{SessionHolder, SessionState};
pub use types::{AccessTier, Identity, SubjectId, UnknownTier};
