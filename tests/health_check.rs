// ABOUTME: Integration tests for bounded health polling.
// ABOUTME: Uses paused time so attempt counts and waits are exact.

mod support;

use portico::command::Cmd;
use portico::proxy::{HealthChecker, HealthOutcome, ProxyError};
use portico::types::Host;
use std::time::Duration;
use support::{ScriptedExecutor, ok, unreachable};

fn query() -> Cmd {
    Cmd::new("health-query")
}

#[tokio::test(start_paused = true)]
async fn becomes_healthy_after_starting() {
    let executor = ScriptedExecutor::new().sequence(
        "health-query",
        vec![ok("health:starting"), ok("health:starting"), ok("health:healthy")],
    );
    let checker = HealthChecker::with_bounds(&executor, 5, Duration::from_secs(1));

    let outcome = checker.wait_healthy(&Host::new("h"), &query()).await.unwrap();

    assert_eq!(outcome, HealthOutcome::Healthy);
    assert_eq!(executor.count("health-query"), 3);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_the_last_attempt() {
    let executor = ScriptedExecutor::new().on("health-query", ok("health:starting"));
    let checker = HealthChecker::with_bounds(&executor, 4, Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    let outcome = checker.wait_healthy(&Host::new("h"), &query()).await.unwrap();

    assert_eq!(outcome, HealthOutcome::Timeout);
    assert_eq!(executor.count("health-query"), 4);
    // No pause after the last attempt.
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn unhealthy_ends_the_wait_immediately() {
    let executor = ScriptedExecutor::new().on("health-query", ok("health:unhealthy"));
    let checker = HealthChecker::with_bounds(&executor, 10, Duration::from_secs(1));

    let outcome = checker.wait_healthy(&Host::new("h"), &query()).await.unwrap();

    assert_eq!(outcome, HealthOutcome::Unhealthy);
    assert_eq!(executor.count("health-query"), 1);
}

#[tokio::test(start_paused = true)]
async fn container_without_health_check_passes() {
    let executor = ScriptedExecutor::new().on("health-query", ok("state:running"));
    let checker = HealthChecker::with_bounds(&executor, 3, Duration::from_secs(1));

    let outcome = checker.wait_healthy(&Host::new("h"), &query()).await.unwrap();
    assert_eq!(outcome, HealthOutcome::Healthy);
}

#[tokio::test(start_paused = true)]
async fn absent_container_times_out() {
    let executor = ScriptedExecutor::new();
    let checker = HealthChecker::with_bounds(&executor, 2, Duration::from_secs(1));

    let err = checker
        .gate(&Host::new("h"), "app-workers-v1", &query())
        .await
        .unwrap_err();

    let ProxyError::HealthGateFailed { outcome, attempts, .. } = err else {
        panic!("expected a health gate failure, got {err:?}");
    };
    assert_eq!(outcome, HealthOutcome::Timeout);
    assert_eq!(attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn transport_errors_are_not_retried() {
    let executor = ScriptedExecutor::new().on("health-query", unreachable());
    let checker = HealthChecker::with_bounds(&executor, 5, Duration::from_secs(1));

    assert!(checker.wait_healthy(&Host::new("h"), &query()).await.is_err());
    assert_eq!(executor.count("health-query"), 1);
}
