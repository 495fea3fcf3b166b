// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `dojo-portal`: inspect access decisions made by the member portal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dojo_common_http::RetryConfig;
use dojo_portal_auth::{
	landing, screens_for, AccessTier, AdminAllowList, HttpDirectory, Identity,
	LocalIdentityProvider, ResolvedSession, RoleResolver, Screen, SessionHolder,
};
use dojo_portal_config::{DirectoryConfig, LogFormat, PortalConfig};
use serde::Serialize;
use tracing::{debug, info};

mod logging;

/// Dojo portal access tooling
#[derive(Parser, Debug)]
#[command(name = "dojo-portal", version, about, long_about = None)]
struct Args {
	/// Path to configuration file (defaults to /etc/dojo-portal/portal.toml)
	#[arg(short, long, env = "DOJO_PORTAL_CONFIG")]
	config: Option<PathBuf>,

	/// Log level filter (overrides config)
	#[arg(short, long)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Resolve the access tier for an email against the configured directory
	Resolve {
		/// Email address of the signed-in identity
		#[arg(long)]
		email: String,
		/// Display name to attach to the identity
		#[arg(long, default_value = "")]
		name: String,
		/// Subject id to attach to the identity (defaults to the email)
		#[arg(long)]
		subject: Option<String>,
	},
	/// Show which screens each tier may view
	Screens {
		/// Only show this tier (guest, pending_approval, member, admin)
		#[arg(long)]
		tier: Option<AccessTier>,
		/// Show the signed-out view
		#[arg(long, conflicts_with = "tier")]
		signed_out: bool,
	},
	/// Print the effective configuration (secrets redacted)
	Config,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
	session: Option<ResolvedSession>,
	landing: Screen,
	screens: Vec<Screen>,
}

#[derive(Debug, Serialize)]
struct ScreensOutput {
	tier: Option<AccessTier>,
	landing: Screen,
	screens: Vec<Screen>,
}

impl ScreensOutput {
	fn for_tier(tier: Option<AccessTier>) -> Self {
		Self {
			tier,
			landing: landing(tier),
			screens: screens_for(tier),
		}
	}
}

fn load_config(args: &Args) -> Result<PortalConfig> {
	let mut config = match &args.config {
		Some(path) => dojo_portal_config::load_config_with_file(path),
		None => dojo_portal_config::load_config(),
	}
	.context("failed to load configuration")?;

	if let Some(level) = &args.log_level {
		config.logging.level = level.clone();
	}
	if args.json_logs {
		config.logging.format = LogFormat::Json;
	}
	Ok(config)
}

fn retry_config(config: &DirectoryConfig) -> RetryConfig {
	RetryConfig {
		max_attempts: config.max_attempts,
		..RetryConfig::default()
	}
}

/// Overall deadline for one resolution: `timeout_secs` bounds each HTTP
/// request, so the whole lookup gets room for every retry and its backoff.
fn lookup_budget(config: &DirectoryConfig) -> Duration {
	retry_config(config).worst_case_duration(config.timeout())
}

fn build_directory(config: &DirectoryConfig) -> Result<HttpDirectory> {
	let http = dojo_common_http::new_client_with_timeout(config.timeout())
		.context("failed to build HTTP client")?;

	let mut directory =
		HttpDirectory::new(config.base_url.clone(), http).with_retry_config(retry_config(config));
	if let Some(token) = &config.api_token {
		directory = directory.with_api_token(token.clone());
	}
	Ok(directory)
}

async fn run_resolve(config: &PortalConfig, identity: Identity) -> Result<ResolveOutput> {
	let directory_config = config.directory.as_ref().context(
		"no directory configured; set [directory] base_url or DOJO_PORTAL_DIRECTORY_URL",
	)?;

	let resolver = RoleResolver::new(
		build_directory(directory_config)?,
		AdminAllowList::new(config.auth.admin_emails.iter().cloned()),
	)
	.with_lookup_timeout(lookup_budget(directory_config));

	let provider = Arc::new(LocalIdentityProvider::signed_in(identity));
	let mut holder = SessionHolder::start(provider, Arc::new(resolver));

	let state = holder
		.settled()
		.await
		.context("session holder stopped before resolving")?;
	holder.shutdown().await;

	let tier = state.session.as_ref().map(|s| s.tier);
	debug!(generation = state.generation, ?tier, "resolution settled");

	Ok(ResolveOutput {
		session: state.session,
		landing: landing(tier),
		screens: screens_for(tier),
	})
}

fn run_screens(tier: Option<AccessTier>, signed_out: bool) -> Vec<ScreensOutput> {
	if signed_out {
		return vec![ScreensOutput::for_tier(None)];
	}
	match tier {
		Some(tier) => vec![ScreensOutput::for_tier(Some(tier))],
		None => std::iter::once(None)
			.chain(AccessTier::all().iter().copied().map(Some))
			.map(ScreensOutput::for_tier)
			.collect(),
	}
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
	let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
	println!("{out}");
	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let config = load_config(&args)?;
	logging::init_tracing(&config.logging);

	info!(version = env!("CARGO_PKG_VERSION"), "starting dojo-portal");

	match args.command {
		Command::Resolve {
			email,
			name,
			subject,
		} => {
			let subject = subject.unwrap_or_else(|| email.clone());
			let output = run_resolve(&config, Identity::new(subject, email, name)).await?;
			print_json(&output)
		}
		Command::Screens { tier, signed_out } => print_json(&run_screens(tier, signed_out)),
		Command::Config => print_json(&config),
	}
}
