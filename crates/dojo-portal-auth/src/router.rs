// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Screen visibility by access tier.
//!
//! `None` stands for "signed out" throughout; a signed-in visitor always has a
//! tier.

use serde::Serialize;
use std::fmt;

use crate::resolver::ResolvedSession;
use crate::types::AccessTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
	// Public
	Home,
	Schedule,
	Faq,
	Join,
	Contact,
	// Signed in
	PendingNotice,
	MemberHome,
	News,
	Documents,
	// Admin
	Roster,
	Attendance,
	Accounting,
	NewsAdmin,
	DocumentAdmin,
}

impl Screen {
	pub fn all() -> &'static [Screen] {
		&[
			Screen::Home,
			Screen::Schedule,
			Screen::Faq,
			Screen::Join,
			Screen::Contact,
			Screen::PendingNotice,
			Screen::MemberHome,
			Screen::News,
			Screen::Documents,
			Screen::Roster,
			Screen::Attendance,
			Screen::Accounting,
			Screen::NewsAdmin,
			Screen::DocumentAdmin,
		]
	}

	pub fn is_public(&self) -> bool {
		matches!(
			self,
			Screen::Home | Screen::Schedule | Screen::Faq | Screen::Join | Screen::Contact
		)
	}

	pub fn is_admin_only(&self) -> bool {
		matches!(
			self,
			Screen::Roster
				| Screen::Attendance
				| Screen::Accounting
				| Screen::NewsAdmin
				| Screen::DocumentAdmin
		)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Screen::Home => "home",
			Screen::Schedule => "schedule",
			Screen::Faq => "faq",
			Screen::Join => "join",
			Screen::Contact => "contact",
			Screen::PendingNotice => "pending_notice",
			Screen::MemberHome => "member_home",
			Screen::News => "news",
			Screen::Documents => "documents",
			Screen::Roster => "roster",
			Screen::Attendance => "attendance",
			Screen::Accounting => "accounting",
			Screen::NewsAdmin => "news_admin",
			Screen::DocumentAdmin => "document_admin",
		}
	}
}

impl fmt::Display for Screen {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown screen: {0}")]
pub struct UnknownScreen(pub String);

impl std::str::FromStr for Screen {
	type Err = UnknownScreen;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
		Screen::all()
			.iter()
			.copied()
			.find(|screen| screen.as_str() == wanted)
			.ok_or_else(|| UnknownScreen(s.to_string()))
	}
}

/// Outcome of asking to show a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "screen", rename_all = "snake_case")]
pub enum RouteDecision {
	Show(Screen),
	/// Signed out and the screen is not public.
	SignInRequired,
	/// Signed in but not permitted; go to the tier's landing screen.
	Redirect(Screen),
}

/// Whether `tier` may view `screen`.
pub fn can_view(tier: Option<AccessTier>, screen: Screen) -> bool {
	if screen.is_public() {
		return true;
	}
	match tier {
		None | Some(AccessTier::Guest) => false,
		Some(AccessTier::PendingApproval) => screen == Screen::PendingNotice,
		Some(AccessTier::Member) => {
			matches!(screen, Screen::MemberHome | Screen::News | Screen::Documents)
		}
		Some(AccessTier::Admin) => screen != Screen::PendingNotice,
	}
}

/// Screens visible to `tier`, in catalogue order.
pub fn screens_for(tier: Option<AccessTier>) -> Vec<Screen> {
	Screen::all()
		.iter()
		.copied()
		.filter(|screen| can_view(tier, *screen))
		.collect()
}

/// Where a visitor lands after sign-in state settles.
pub fn landing(tier: Option<AccessTier>) -> Screen {
	match tier {
		None => Screen::Home,
		Some(AccessTier::Guest) => Screen::Join,
		Some(AccessTier::PendingApproval) => Screen::PendingNotice,
		Some(AccessTier::Member) => Screen::MemberHome,
		Some(AccessTier::Admin) => Screen::Roster,
	}
}

pub fn route(session: Option<&ResolvedSession>, requested: Screen) -> RouteDecision {
	let tier = session.map(|s| s.tier);
	if can_view(tier, requested) {
		RouteDecision::Show(requested)
	} else if tier.is_none() {
		RouteDecision::SignInRequired
	} else {
		RouteDecision::Redirect(landing(tier))
	}
}
