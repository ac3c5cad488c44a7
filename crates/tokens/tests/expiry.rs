//! Lifetime boundaries: a token presented after its lifetime fails on every
//! code path.
//!
//! Token expiry has one-second resolution. Most tests sleep just past two
//! seconds; the boundary test issues late in a wall-clock second and checks
//! just past the lifetime.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::{Duration, Instant};

use chrono::Utc;
use credcore_tokens::{
    TokenError, assert_token_error,
    testutil::{TEST_IP, TEST_USER_AGENT, create_request, memory_service},
};

const PAST_EXPIRY: Duration = Duration::from_millis(2200);

#[tokio::test]
async fn expired_pair_fails_check_and_extend() {
    let service = memory_service(Duration::from_secs(1), Duration::from_secs(1));
    let pair = service.create_token(create_request("u1", "fp")).await.expect("create");

    tokio::time::sleep(PAST_EXPIRY).await;

    assert_token_error!(
        service.check_token(&pair.access.token, TEST_USER_AGENT, TEST_IP, "fp").await,
        TokenError::InvalidToken
    );
    assert_token_error!(service.extend_token(&pair.refresh.token, "fp").await, TokenError::InvalidToken);
    assert!(service.get_user_tokens("u1").await.expect("list").is_empty());
    assert!(service.store().get(pair.id()).await.expect("get").is_none());
}

#[tokio::test]
async fn expired_access_token_fails_while_refresh_still_works() {
    let service = memory_service(Duration::from_secs(1), Duration::from_secs(30));
    let pair = service.create_token(create_request("u1", "fp")).await.expect("create");

    tokio::time::sleep(PAST_EXPIRY).await;

    assert_token_error!(
        service.check_token(&pair.access.token, TEST_USER_AGENT, TEST_IP, "fp").await,
        TokenError::InvalidToken
    );

    let renewed = service.extend_token(&pair.refresh.token, "fp").await.expect("extend");
    service
        .check_token(&renewed.access.token, TEST_USER_AGENT, TEST_IP, "fp")
        .await
        .expect("renewed access token");
}

#[tokio::test]
async fn expired_session_is_not_found_for_delete() {
    let service = memory_service(Duration::from_secs(1), Duration::from_secs(1));
    let pair = service.create_token(create_request("u1", "fp")).await.expect("create");

    tokio::time::sleep(PAST_EXPIRY).await;

    assert_token_error!(service.delete_token(pair.id(), "u1").await, TokenError::InvalidToken);
    assert_eq!(service.delete_user_tokens("u1").await.expect("delete"), 0);
}

/// Sleeps until roughly 900ms into the current wall-clock second.
async fn align_late_in_second() {
    let into_second = u64::from(Utc::now().timestamp_subsec_millis() % 1000);
    let wait = (1900 - into_second) % 1000;
    tokio::time::sleep(Duration::from_millis(wait)).await;
}

#[tokio::test]
async fn access_token_is_rejected_just_past_its_lifetime() {
    let service = memory_service(Duration::from_secs(1), Duration::from_secs(30));

    align_late_in_second().await;
    let issued_at = Instant::now();
    let pair = service.create_token(create_request("u1", "fp")).await.expect("create");

    tokio::time::sleep(Duration::from_millis(1050)).await;
    assert!(issued_at.elapsed() > pair.access.lifetime);

    assert_token_error!(
        service.check_token(&pair.access.token, TEST_USER_AGENT, TEST_IP, "fp").await,
        TokenError::InvalidToken
    );
}
