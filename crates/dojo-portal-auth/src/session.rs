// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session holder: keeps the current [`ResolvedSession`] in step with the
//! identity provider.
//!
//! A driver task owns the provider subscription and is the only writer of
//! [`SessionState`]. Readers observe it through a `watch` channel.
//!
//! Every identity-changed event bumps a generation counter and starts a
//! resolution tagged with that generation. A finished resolution is applied
//! only if its generation is still the latest; older ones are discarded.
//! Superseded lookups are left to finish rather than aborted.
//!
//! If the latest resolution task itself dies, the identity it was resolving
//! is applied as [`Guest`](crate::types::AccessTier::Guest) without a record,
//! or as no session for a sign-out.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::directory::DirectoryLookup;
use crate::provider::{IdentityEvents, IdentityProvider, SignInError, SignInMethod, SignInOutcome};
use crate::resolver::{ResolvedSession, RoleResolver};
use crate::types::Identity;

/// Snapshot of the holder's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
	/// `None` while signed out, and before the first resolution completes.
	pub session: Option<ResolvedSession>,
	/// True from startup until the latest identity event has been resolved.
	pub is_loading: bool,
	/// Number of identity events seen so far.
	pub generation: u64,
}

impl SessionState {
	fn initial() -> Self {
		Self {
			session: None,
			is_loading: true,
			generation: 0,
		}
	}
}

pub struct SessionHolder<P: IdentityProvider> {
	provider: Arc<P>,
	state_rx: watch::Receiver<SessionState>,
	shutdown_tx: Option<oneshot::Sender<()>>,
	driver: Option<JoinHandle<()>>,
}

impl<P: IdentityProvider> SessionHolder<P> {
	/// Starts the driver task. Must be called inside a tokio runtime.
	///
	/// The driver first completes any pending redirect sign-in, then
	/// subscribes to identity changes.
	pub fn start<D>(provider: Arc<P>, resolver: Arc<RoleResolver<D>>) -> Self
	where
		D: DirectoryLookup + 'static,
	{
		let (state_tx, state_rx) = watch::channel(SessionState::initial());
		let (shutdown_tx, shutdown_rx) = oneshot::channel();

		let driver = tokio::spawn(drive(
			Arc::clone(&provider),
			resolver,
			state_tx,
			shutdown_rx,
		));

		Self {
			provider,
			state_rx,
			shutdown_tx: Some(shutdown_tx),
			driver: Some(driver),
		}
	}

	pub fn current(&self) -> Option<ResolvedSession> {
		self.state_rx.borrow().session.clone()
	}

	pub fn is_loading(&self) -> bool {
		self.state_rx.borrow().is_loading
	}

	pub fn state(&self) -> SessionState {
		self.state_rx.borrow().clone()
	}

	/// Returns a receiver that observes every state change.
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state_rx.clone()
	}

	/// Waits until the latest identity event has been resolved.
	///
	/// Returns `None` if the driver stopped first.
	pub async fn settled(&self) -> Option<SessionState> {
		let mut rx = self.state_rx.clone();
		let state = rx.wait_for(|state| !state.is_loading).await.ok()?;
		Some(state.clone())
	}

	/// Begins interactive sign-in. The resulting identity reaches the holder
	/// through the provider's event stream; on error the state is untouched.
	pub async fn sign_in(&self, method: SignInMethod) -> Result<SignInOutcome, SignInError> {
		self.provider.sign_in(method).await
	}

	/// Asks the provider to sign out. The `None` identity event that follows is
	/// handled like any other.
	pub async fn sign_out(&self) -> Result<(), SignInError> {
		self.provider.sign_out().await
	}

	/// Stops the driver and waits for it to exit, releasing the subscription.
	pub async fn shutdown(&mut self) {
		if let Some(tx) = self.shutdown_tx.take() {
			let _ = tx.send(());
		}
		if let Some(driver) = self.driver.take() {
			if let Err(e) = driver.await {
				if !e.is_cancelled() {
					warn!(error = %e, "session driver ended abnormally");
				}
			}
		}
	}

	pub fn is_running(&self) -> bool {
		self.driver.as_ref().is_some_and(|d| !d.is_finished())
	}
}

impl<P: IdentityProvider> Drop for SessionHolder<P> {
	fn drop(&mut self) {
		if let Some(driver) = self.driver.take() {
			driver.abort();
		}
	}
}

type Resolution = (u64, Option<ResolvedSession>);

/// The resolution task for the latest generation, and the identity it was
/// started for.
struct LatestTask {
	id: task::Id,
	identity: Option<Identity>,
}

async fn drive<P, D>(
	provider: Arc<P>,
	resolver: Arc<RoleResolver<D>>,
	state_tx: watch::Sender<SessionState>,
	mut shutdown_rx: oneshot::Receiver<()>,
) where
	P: IdentityProvider,
	D: DirectoryLookup + 'static,
{
	match provider.take_redirect_result().await {
		Ok(Some(identity)) => info!(email = %identity.email, "picked up redirect sign-in"),
		Ok(None) => {}
		Err(e) => warn!(error = %e, "pending redirect sign-in could not be completed"),
	}

	let mut events: IdentityEvents = provider.subscribe().await;
	let mut events_open = true;
	let mut generation: u64 = 0;
	let mut in_flight: JoinSet<Resolution> = JoinSet::new();
	let mut latest: Option<LatestTask> = None;

	debug!("session driver started");

	loop {
		if !events_open && in_flight.is_empty() {
			break;
		}

		tokio::select! {
			_ = &mut shutdown_rx => {
				debug!("session driver shutting down");
				break;
			}

			event = events.recv(), if events_open => match event {
				Some(identity) => {
					generation += 1;
					debug!(
						generation,
						signed_in = identity.is_some(),
						"identity changed"
					);
					state_tx.send_modify(|state| {
						state.generation = generation;
						state.is_loading = true;
					});

					let resolver = Arc::clone(&resolver);
					let fallback = identity.clone();
					let handle = in_flight.spawn(async move {
						let session = resolver.resolve(identity.as_ref()).await;
						(generation, session)
					});
					latest = Some(LatestTask {
						id: handle.id(),
						identity: fallback,
					});
				}
				None => {
					debug!("identity stream closed");
					events_open = false;
				}
			},

			Some(joined) = in_flight.join_next_with_id(), if !in_flight.is_empty() => match joined {
				Ok((_, (resolved_for, session))) if resolved_for == generation => {
					debug!(
						generation,
						email = session.as_ref().map(ResolvedSession::email),
						tier = ?session.as_ref().map(|s| s.tier),
						"session resolved"
					);
					latest = None;
					state_tx.send_modify(|state| {
						state.session = session;
						state.is_loading = false;
					});
				}
				Ok((_, (resolved_for, _))) => {
					debug!(resolved_for, latest = generation, "discarding stale resolution");
				}
				Err(e) if latest.as_ref().is_some_and(|task| task.id == e.id()) => {
					let identity = latest.take().and_then(|task| task.identity);
					warn!(
						error = %e,
						generation,
						signed_in = identity.is_some(),
						"session resolution task failed, resolving as guest"
					);
					let session = identity.map(ResolvedSession::guest);
					state_tx.send_modify(|state| {
						state.session = session;
						state.is_loading = false;
					});
				}
				Err(e) => {
					debug!(error = %e, "stale session resolution task failed");
				}
			},
		}
	}

	// Dropping `events` here unsubscribes from the provider; dropping
	// `in_flight` aborts any resolution still running.
}
