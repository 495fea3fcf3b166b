// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static super-admin allow-list.

use std::collections::HashSet;

/// Emails that are always granted the admin tier.
///
/// Loaded once from deployment configuration and never mutated afterwards.
/// Membership is an exact, case-sensitive string comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
	emails: HashSet<String>,
}

impl AdminAllowList {
	pub fn new<I, S>(emails: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			emails: emails.into_iter().map(Into::into).collect(),
		}
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn contains(&self, email: &str) -> bool {
		self.emails.contains(email)
	}

	pub fn len(&self) -> usize {
		self.emails.len()
	}

	pub fn is_empty(&self) -> bool {
		self.emails.is_empty()
	}
}

impl<S: Into<String>> FromIterator<S> for AdminAllowList {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}
