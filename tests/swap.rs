// ABOUTME: Integration tests for rename-then-replace container swaps.
// ABOUTME: Covers parking, registration order, draining and partial failures.

mod support;

use portico::command::{AppCommands, ProxyCommands};
use portico::config::ProxySettings;
use portico::proxy::{ContainerSwapper, ProxyError, ProxyErrorKind, SwapRequest};
use portico::runtime::RuntimeType;
use portico::types::{ContainerId, Host, ImageRef, ServiceName};
use std::time::Duration;
use support::{FixedClock, ScriptedExecutor, fail, ok};

const WEB_ID: &str = "'name=^app-web-latest$' --quiet";
const RUNNING_WEB: &str = "label=role=web --filter status=running";
const APP_RUN: &str = "--name app-web-latest";

struct Fixture {
    service: ServiceName,
    settings: ProxySettings,
    image: ImageRef,
    clock: FixedClock,
    host: Host,
}

impl Fixture {
    fn new() -> Self {
        Self {
            service: ServiceName::new("app").unwrap(),
            settings: ProxySettings::default(),
            image: ImageRef::parse("registry.example.com/app:latest").unwrap(),
            clock: FixedClock::at(2026, 10, 18, 9, 30, 0),
            host: Host::new("1.1.1.1"),
        }
    }

    fn swapper<'a>(&'a self, executor: &'a ScriptedExecutor) -> ContainerSwapper<'a> {
        ContainerSwapper::new(
            executor,
            &self.clock,
            &self.service,
            AppCommands::new(&self.service, RuntimeType::Docker, "kamal", "10m"),
            ProxyCommands::new(&self.settings, RuntimeType::Docker),
            Duration::from_secs(30),
        )
    }

    fn request(&self) -> SwapRequest<'_> {
        SwapRequest {
            role: "web",
            image: &self.image,
            env: &[],
            command: None,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn existing_container_is_parked_under_a_timestamped_name() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok("0ld0ld0ld0ld\n"), ok("abcdefabcdef0123\n")])
        .on(RUNNING_WEB, ok("abcdefabcdef app-web-latest\n"));

    let outcome = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap();

    assert_eq!(outcome.name, "app-web-latest");
    assert_eq!(
        outcome.replaced.as_deref(),
        Some("app-web-latest_replaced_20261018093000000")
    );
    assert_eq!(outcome.container, ContainerId::new("abcdefabcdef0123"));
    assert_eq!(
        executor.count("docker rename app-web-latest app-web-latest_replaced_20261018093000000"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn nothing_is_renamed_when_the_name_is_free() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok(""), ok("abc123\n")])
        .on(RUNNING_WEB, ok("abc123 app-web-latest\n"));

    let outcome = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap();

    assert_eq!(outcome.replaced, None);
    assert!(outcome.stopped.is_empty());
    assert_eq!(executor.count("docker rename"), 0);
    assert_eq!(executor.count("container stop"), 0);
}

#[tokio::test(start_paused = true)]
async fn predecessors_are_stopped_oldest_first_after_registration() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok("old2\n"), ok("new1\n")])
        .on(
            RUNNING_WEB,
            ok("new1 app-web-latest\nold2 app-web-latest_replaced_20261018093000000\nold1 app-web-v1\n"),
        );

    let outcome = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap();

    assert_eq!(
        outcome.stopped,
        vec![ContainerId::new("old1"), ContainerId::new("old2")]
    );

    let commands = executor.commands_on("1.1.1.1");
    let register = commands
        .iter()
        .position(|c| c.contains("kamal-proxy deploy app-web --target new1:80"))
        .unwrap();
    let stop = commands
        .iter()
        .position(|c| c == "docker container stop old1 old2")
        .unwrap();
    assert!(register < stop);
}

#[tokio::test(start_paused = true)]
async fn already_gone_predecessors_are_tolerated() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok(""), ok("new1\n")])
        .on(RUNNING_WEB, ok("new1 app-web-latest\nold1 app-web-v1\n"))
        .on(
            "container stop old1",
            fail(1, "Error response from daemon: No such container: old1"),
        );

    let outcome = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap();

    assert_eq!(outcome.stopped, vec![ContainerId::new("old1")]);
}

#[tokio::test(start_paused = true)]
async fn failed_registration_after_rename_is_a_partial_swap() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok("old1\n"), ok("new1\n")])
        .on("kamal-proxy deploy", fail(1, "target failed to become healthy"));

    let err = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProxyErrorKind::PartialSwapFailure);
    let ProxyError::PartialSwapFailure {
        container,
        replaced_as,
        source,
    } = err
    else {
        unreachable!();
    };
    assert_eq!(container, "app-web-latest");
    assert_eq!(replaced_as, "app-web-latest_replaced_20261018093000000");
    assert_eq!(source.kind(), ProxyErrorKind::CommandFailed);

    // The old container keeps serving; nothing is stopped.
    assert_eq!(executor.count("container stop"), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_without_a_rename_is_reported_as_is() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new()
        .on(WEB_ID, ok(""))
        .on(APP_RUN, fail(125, "pull access denied"));

    let err = fixture
        .swapper(&executor)
        .swap(&fixture.host, fixture.request())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ProxyErrorKind::CommandFailed);
    assert_eq!(executor.count("kamal-proxy deploy"), 0);
}

#[tokio::test]
async fn reregister_skips_parked_containers() {
    let fixture = Fixture::new();
    let executor = ScriptedExecutor::new().on(
        RUNNING_WEB,
        ok("old1 app-web-latest_replaced_20261001000000\ncur1 app-web-latest\n"),
    );

    let registered = fixture
        .swapper(&executor)
        .reregister(&fixture.host, "web")
        .await
        .unwrap();

    assert_eq!(registered, Some(ContainerId::new("cur1")));
    assert_eq!(executor.count("--target cur1:80"), 1);
}

#[tokio::test(start_paused = true)]
async fn environment_reaches_the_container_through_a_file() {
    let fixture = Fixture::new();
    let env = vec![
        ("DATABASE_URL".to_string(), "postgres://db/app".to_string()),
        ("SECRET_KEY_BASE".to_string(), "s3cr3t".to_string()),
    ];
    let executor = ScriptedExecutor::new()
        .sequence(WEB_ID, vec![ok(""), ok("abcdefabcdef0123\n")])
        .on(RUNNING_WEB, ok("abcdefabcdef app-web-latest\n"));

    let request = SwapRequest {
        env: &env,
        ..fixture.request()
    };
    fixture
        .swapper(&executor)
        .swap(&fixture.host, request)
        .await
        .unwrap();

    assert_eq!(
        executor.uploads(),
        vec![(
            r#"mkdir -p "$HOME/.portico/apps/app/env/roles" && umask 077 && cat > "$HOME/.portico/apps/app/env/roles/web.env""#
                .to_string(),
            "DATABASE_URL=postgres://db/app\nSECRET_KEY_BASE=s3cr3t\n".to_string(),
        )]
    );

    let commands = executor.commands_on("1.1.1.1");
    let upload = commands.iter().position(|c| c.contains("web.env\"")).unwrap();
    let run = commands.iter().position(|c| c.contains(APP_RUN)).unwrap();
    assert!(upload < run);
    assert!(commands[run].contains(r#"--env-file "$HOME/.portico/apps/app/env/roles/web.env""#));
    assert!(commands.iter().all(|c| !c.contains("s3cr3t")));
}
