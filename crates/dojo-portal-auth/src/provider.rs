// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider boundary.
//!
//! The provider itself is an external collaborator. This module defines the
//! four operations the session holder consumes and an in-process
//! implementation ([`LocalIdentityProvider`]) used by the CLI and tests.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::types::Identity;

/// Receiver for identity-changed events. Yields `None` on sign-out.
pub type IdentityEvents = mpsc::UnboundedReceiver<Option<Identity>>;

/// How an interactive sign-in should be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMethod {
	/// Popup window; falls back to a redirect if the popup is blocked.
	Popup,
	/// Full-page redirect; completes on the next application start.
	Redirect,
}

/// Successful result of [`IdentityProvider::sign_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
	SignedIn(Identity),
	/// The flow continues elsewhere and completes via
	/// [`IdentityProvider::take_redirect_result`] on the next start.
	RedirectStarted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignInError {
	#[error("sign-in was cancelled")]
	Cancelled,

	#[error("sign-in popup was blocked")]
	Blocked,

	#[error("identity provider error: {0}")]
	Provider(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
	/// Returns the identity from a redirect sign-in begun before this start,
	/// if any. Consumes it: a second call returns `Ok(None)`.
	async fn take_redirect_result(&self) -> Result<Option<Identity>, SignInError>;

	/// Subscribes to identity changes. The current identity (or `None`) is
	/// delivered first. Dropping the receiver unsubscribes.
	async fn subscribe(&self) -> IdentityEvents;

	async fn sign_in(&self, method: SignInMethod) -> Result<SignInOutcome, SignInError>;

	async fn sign_out(&self) -> Result<(), SignInError>;
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
	async fn take_redirect_result(&self) -> Result<Option<Identity>, SignInError> {
		(**self).take_redirect_result().await
	}

	async fn subscribe(&self) -> IdentityEvents {
		(**self).subscribe().await
	}

	async fn sign_in(&self, method: SignInMethod) -> Result<SignInOutcome, SignInError> {
		(**self).sign_in(method).await
	}

	async fn sign_out(&self) -> Result<(), SignInError> {
		(**self).sign_out().await
	}
}

// =============================================================================
// Local provider
// =============================================================================

#[derive(Debug, Default)]
struct LocalState {
	current: Option<Identity>,
	pending_redirect: Option<Identity>,
	redirect_error: Option<SignInError>,
	next_sign_in: Option<Result<Identity, SignInError>>,
	popup_blocked: bool,
	no_redirect_fallback: bool,
	subscribers: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

impl LocalState {
	fn set_current(&mut self, identity: Option<Identity>) {
		self.current = identity;
		let current = self.current.clone();
		self.subscribers.retain(|tx| tx.send(current.clone()).is_ok());
	}
}

/// In-process identity provider.
///
/// Sign-in outcomes are scripted with [`set_next_sign_in`](Self::set_next_sign_in);
/// a redirect started by [`sign_in`](IdentityProvider::sign_in) is parked and
/// handed out once by `take_redirect_result`, as a real provider does across a
/// page load.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider {
	state: Mutex<LocalState>,
}

impl LocalIdentityProvider {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts already signed in as `identity`.
	pub fn signed_in(identity: Identity) -> Self {
		Self {
			state: Mutex::new(LocalState {
				current: Some(identity),
				..LocalState::default()
			}),
		}
	}

	/// A redirect sign-in completed before this start.
	pub fn with_pending_redirect(mut self, identity: Identity) -> Self {
		self.state.get_mut().pending_redirect = Some(identity);
		self
	}

	/// The pending-redirect check fails with `error`.
	pub fn with_redirect_error(mut self, error: SignInError) -> Self {
		self.state.get_mut().redirect_error = Some(error);
		self
	}

	/// Popups are blocked; popup sign-in falls back to a redirect.
	pub fn with_popup_blocked(mut self) -> Self {
		self.state.get_mut().popup_blocked = true;
		self
	}

	/// Blocked popups fail with [`SignInError::Blocked`] instead of redirecting.
	pub fn without_redirect_fallback(mut self) -> Self {
		self.state.get_mut().no_redirect_fallback = true;
		self
	}

	/// Scripts the result of the next interactive sign-in.
	pub async fn set_next_sign_in(&self, result: Result<Identity, SignInError>) {
		self.state.lock().await.next_sign_in = Some(result);
	}

	/// Replaces the current identity and notifies subscribers, as the
	/// provider does when its own session changes (token expiry, another tab).
	pub async fn emit(&self, identity: Option<Identity>) {
		self.state.lock().await.set_current(identity);
	}

	pub async fn current(&self) -> Option<Identity> {
		self.state.lock().await.current.clone()
	}

	pub async fn subscriber_count(&self) -> usize {
		let mut state = self.state.lock().await;
		state.subscribers.retain(|tx| !tx.is_closed());
		state.subscribers.len()
	}
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
	async fn take_redirect_result(&self) -> Result<Option<Identity>, SignInError> {
		let mut state = self.state.lock().await;
		if let Some(error) = state.redirect_error.take() {
			return Err(error);
		}
		let identity = state.pending_redirect.take();
		if let Some(identity) = &identity {
			info!(email = %identity.email, "completed redirect sign-in");
			state.set_current(Some(identity.clone()));
		}
		Ok(identity)
	}

	async fn subscribe(&self) -> IdentityEvents {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut state = self.state.lock().await;
		// Unbounded send only fails once the receiver is gone, which it is not yet.
		let _ = tx.send(state.current.clone());
		state.subscribers.push(tx);
		debug!(subscribers = state.subscribers.len(), "identity subscriber added");
		rx
	}

	async fn sign_in(&self, method: SignInMethod) -> Result<SignInOutcome, SignInError> {
		let mut state = self.state.lock().await;
		let result = state
			.next_sign_in
			.take()
			.unwrap_or(Err(SignInError::Cancelled));

		let via_redirect = match method {
			SignInMethod::Redirect => true,
			SignInMethod::Popup if state.popup_blocked && state.no_redirect_fallback => {
				return Err(SignInError::Blocked);
			}
			SignInMethod::Popup => state.popup_blocked,
		};

		if via_redirect {
			if method == SignInMethod::Popup {
				info!("popup blocked, falling back to redirect sign-in");
			}
			// Outcome is only observable after the redirect returns.
			match result {
				Ok(identity) => state.pending_redirect = Some(identity),
				Err(error) => state.redirect_error = Some(error),
			}
			return Ok(SignInOutcome::RedirectStarted);
		}

		let identity = result?;
		info!(email = %identity.email, "signed in");
		state.set_current(Some(identity.clone()));
		Ok(SignInOutcome::SignedIn(identity))
	}

	async fn sign_out(&self) -> Result<(), SignInError> {
		let mut state = self.state.lock().await;
		if state.current.is_some() {
			info!("signed out");
		}
		state.set_current(None);
		Ok(())
	}
}
