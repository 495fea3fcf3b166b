// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the dojo portal.

pub mod auth;
pub mod directory;
pub mod logging;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use directory::{DirectoryConfig, DirectoryConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
