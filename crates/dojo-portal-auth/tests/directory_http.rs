// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP directory tests against a mock spreadsheet API.
//!
//! Tests cover:
//! - Record, null member and 404 responses
//! - Bearer token propagation
//! - Retry of transient failures
//! - Malformed payloads and non-retryable statuses
//! - Resolver fallback to guest on directory errors

use std::time::Duration;

use dojo_common_config::SecretString;
use dojo_common_http::RetryConfig;
use dojo_portal_auth::{
	AccessTier, AdminAllowList, DirectoryError, DirectoryLookup, HttpDirectory, Identity,
	MembershipStatus, PermissionLevel, RoleResolver,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryConfig {
	RetryConfig {
		max_attempts,
		base_delay: Duration::from_millis(1),
		max_delay: Duration::from_millis(5),
		backoff_factor: 2.0,
		jitter: false,
	}
}

fn directory(server: &MockServer) -> HttpDirectory {
	HttpDirectory::new(server.uri().parse().unwrap(), reqwest::Client::new())
		.with_retry_config(fast_retry(3))
}

// ============================================================================
// Responses
// ============================================================================

#[tokio::test]
async fn returns_normalised_record() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.and(query_param("email", "p@club.org"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"member": {
				"id": 42,
				"email": "p@club.org",
				"status": "在籍",
				"permissionLabel": "一般",
				"name": "Pat",
				"joinedOn": "2023/4/1",
				"belt": "brown"
			}
		})))
		.expect(1)
		.mount(&server)
		.await;

	let record = directory(&server)
		.find_by_email("p@club.org")
		.await
		.unwrap()
		.expect("record");

	assert_eq!(record.record_id, "42");
	assert_eq!(record.status, Some(MembershipStatus::Active));
	assert_eq!(record.permission, Some(PermissionLevel::Standard));
	assert_eq!(record.display_name.as_deref(), Some("Pat"));
	assert_eq!(
		record.joined_on,
		chrono::NaiveDate::from_ymd_opt(2023, 4, 1)
	);
	assert_eq!(record.profile.get("belt"), Some(&json!("brown")));
}

#[tokio::test]
async fn null_member_is_not_found() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "member": null })))
		.mount(&server)
		.await;

	assert!(directory(&server)
		.find_by_email("new@person.com")
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn not_found_status_is_not_found() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(404))
		.expect(1)
		.mount(&server)
		.await;

	assert!(directory(&server)
		.find_by_email("new@person.com")
		.await
		.unwrap()
		.is_none());
}

#[tokio::test]
async fn sends_bearer_token() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.and(header("authorization", "Bearer sheet-token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "member": null })))
		.expect(1)
		.mount(&server)
		.await;

	let result = directory(&server)
		.with_api_token(SecretString::new("sheet-token".to_string()))
		.find_by_email("p@club.org")
		.await;
	assert!(result.is_ok(), "got: {result:?}");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn retries_transient_failure() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(503))
		.up_to_n_times(1)
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"member": { "id": "r-1", "email": "p@club.org", "status": "active" }
		})))
		.expect(1)
		.mount(&server)
		.await;

	let record = directory(&server)
		.find_by_email("p@club.org")
		.await
		.unwrap()
		.expect("record after retry");
	assert!(record.is_active());
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(500).set_body_string("script error"))
		.expect(3)
		.mount(&server)
		.await;

	let err = directory(&server)
		.find_by_email("p@club.org")
		.await
		.unwrap_err();
	assert!(
		matches!(err, DirectoryError::Server { status, .. } if status.as_u16() == 500),
		"got: {err:?}"
	);
}

#[tokio::test]
async fn client_error_is_not_retried() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(403))
		.expect(1)
		.mount(&server)
		.await;

	let err = directory(&server)
		.find_by_email("p@club.org")
		.await
		.unwrap_err();
	assert!(matches!(err, DirectoryError::Server { .. }), "got: {err:?}");
}

#[tokio::test]
async fn malformed_body_is_an_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
		.expect(1)
		.mount(&server)
		.await;

	let err = directory(&server)
		.find_by_email("p@club.org")
		.await
		.unwrap_err();
	assert!(matches!(err, DirectoryError::Malformed(_)), "got: {err:?}");
}

// ============================================================================
// Resolver over HTTP
// ============================================================================

#[tokio::test]
async fn resolver_downgrades_directory_outage_to_guest() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(502))
		.mount(&server)
		.await;

	let resolver = RoleResolver::new(directory(&server), AdminAllowList::empty());
	let session = resolver
		.resolve(Some(&Identity::new("uid", "x@x.com", "X")))
		.await
		.unwrap();

	assert_eq!(session.tier, AccessTier::Guest);
	assert!(session.membership_record.is_none());
}

#[tokio::test]
async fn resolver_reads_admin_label_over_http() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/members/lookup"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"member": { "id": "r-9", "email": "sensei@club.org", "status": "休会", "permissionLabel": "管理者" }
		})))
		.mount(&server)
		.await;

	let resolver = RoleResolver::new(directory(&server), AdminAllowList::empty());
	let session = resolver
		.resolve(Some(&Identity::new("uid", "sensei@club.org", "Sensei")))
		.await
		.unwrap();

	assert_eq!(session.tier, AccessTier::Admin);
	assert!(session.membership_record.is_some());
}

#[tokio::test]
async fn allow_listed_admin_never_hits_the_directory() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(500))
		.expect(0)
		.mount(&server)
		.await;

	let resolver = RoleResolver::new(
		directory(&server),
		AdminAllowList::new(["admin@club.org"]),
	);
	let session = resolver
		.resolve(Some(&Identity::new("uid", "admin@club.org", "Admin")))
		.await
		.unwrap();
	assert_eq!(session.tier, AccessTier::Admin);
}
