// ABOUTME: Integration tests for boot, reboot and upgrade against a scripted fleet.
// ABOUTME: Verifies the exact remote commands each operation issues and their order.

mod support;

use portico::deploy::{DeploymentPlan, Fleet, HostOutcome, Mode, Operation, Phase, deploy_proxy};
use portico::diagnostics::{Diagnostics, WarningKind};
use portico::proxy::ProxyErrorKind;
use support::{FixedClock, HEALTH, INSPECT, PROXY_RUN, ScriptedExecutor, ok, running_proxy};

const LEGACY_PROXY_CLEANUP: &str = "docker container stop traefik ; docker container prune --force --filter label=org.opencontainers.image.title=Traefik && docker image prune --all --force --filter label=org.opencontainers.image.title=Traefik";
const PROXY_CONTAINER_PRUNE: &str =
    "docker container prune --force --filter label=org.opencontainers.image.title=kamal-proxy";
const PROXY_IMAGE_PRUNE: &str =
    "docker image prune --all --force --filter label=org.opencontainers.image.title=kamal-proxy";

fn position(commands: &[String], needle: &str) -> usize {
    commands
        .iter()
        .position(|c| c.contains(needle))
        .unwrap_or_else(|| panic!("no command containing {needle:?} in {commands:#?}"))
}

async fn run(executor: &ScriptedExecutor, operation: Operation) -> (portico::deploy::Report, Diagnostics) {
    support::init_tracing();
    let config = support::config(&["1.1.1.1"]);
    let clock = FixedClock::at(2026, 10, 18, 12, 0, 0);
    let diagnostics = Diagnostics::default();
    let plan = DeploymentPlan::build(&config, operation, Mode::Parallel).unwrap();

    let report = {
        let fleet = Fleet::new(&config, executor, &clock, &diagnostics);
        deploy_proxy(&fleet, &plan, None).await.unwrap()
    };
    (report, diagnostics)
}

mod boot {
    use super::*;

    #[tokio::test]
    async fn absent_proxy_is_created_once() {
        let executor = ScriptedExecutor::new();
        let (report, _) = run(&executor, Operation::Boot).await;

        assert!(report.is_success());
        assert_eq!(executor.count(PROXY_RUN), 1);
        assert_eq!(executor.count("basecamp/kamal-proxy:v0.9.0"), 1);
        assert_eq!(executor.count("container start"), 0);
        assert_eq!(executor.count("container stop"), 0);
        assert_eq!(executor.count("prune"), 0);
    }

    #[tokio::test]
    async fn host_is_prepared_before_the_proxy_runs() {
        let executor = ScriptedExecutor::new();
        run(&executor, Operation::Boot).await;

        let commands = executor.commands_on("1.1.1.1");
        let mkdir = position(&commands, r#"mkdir -p "$HOME/.portico/proxy/config""#);
        let network = position(&commands, "network inspect kamal");
        let proxy = position(&commands, PROXY_RUN);
        assert!(mkdir < proxy && network < proxy);
    }

    #[tokio::test]
    async fn existing_proxy_is_started_or_recreated() {
        let executor = ScriptedExecutor::new().on(INSPECT, ok("exited basecamp/kamal-proxy:v0.9.0"));
        let (report, _) = run(&executor, Operation::Boot).await;

        assert!(report.is_success());
        assert_eq!(
            executor.count("docker container start kamal-proxy || docker run --name kamal-proxy"),
            1
        );
    }

    #[tokio::test]
    async fn outdated_running_proxy_blocks_boot() {
        let executor = ScriptedExecutor::new().on(INSPECT, running_proxy("v0.8.2"));
        let (report, _) = run(&executor, Operation::Boot).await;

        let HostOutcome::Failed(err) = report.outcome("1.1.1.1").unwrap() else {
            panic!("boot should fail");
        };
        assert_eq!(err.phase(), Phase::VersionCheck);
        assert_eq!(err.kind(), ProxyErrorKind::VersionIncompatible);
        assert_eq!(
            err.cause().to_string(),
            "kamal-proxy version v0.8.2 is too old, please reboot to update to at least v0.9.0"
        );
        assert_eq!(executor.count(PROXY_RUN), 0);
    }

    #[tokio::test]
    async fn failed_version_check_never_takes_the_lock() {
        let executor = ScriptedExecutor::new().on(INSPECT, running_proxy("v0.8.2"));
        run(&executor, Operation::Boot).await;

        let commands = executor.commands_on("1.1.1.1");
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains(INSPECT));
        assert_eq!(executor.count(".local/state/portico"), 0);
    }

    #[tokio::test]
    async fn lock_follows_the_version_check() {
        let executor = ScriptedExecutor::new();
        run(&executor, Operation::Boot).await;

        let commands = executor.commands_on("1.1.1.1");
        let inspect = position(&commands, INSPECT);
        let lock = position(&commands, ".local/state/portico");
        assert!(inspect < lock);
        assert!(commands.last().unwrap().starts_with("rm -f"));
    }

    #[tokio::test]
    async fn legacy_proxy_is_left_alone() {
        let executor = ScriptedExecutor::new();
        run(&executor, Operation::Boot).await;

        assert_eq!(executor.count("traefik"), 0);
    }
}

mod reboot {
    use super::*;

    const RUNNING_WEB: &str = "label=role=web --filter status=running";

    #[tokio::test]
    async fn outdated_proxy_is_replaced() {
        let executor = ScriptedExecutor::new()
            .on(INSPECT, running_proxy("v0.8.2"))
            .on(HEALTH, ok("health:healthy"))
            .on(RUNNING_WEB, ok("abc123 app-web-latest\n"));
        let (report, diagnostics) = run(&executor, Operation::Reboot).await;

        assert!(report.is_success(), "{report}");
        assert!(!diagnostics.has_warnings());

        let commands = executor.commands_on("1.1.1.1");
        let stop = position(&commands, "docker container stop kamal-proxy");
        let prune = position(&commands, PROXY_CONTAINER_PRUNE);
        let start = position(&commands, PROXY_RUN);
        let health = position(&commands, HEALTH);
        let register = position(&commands, "kamal-proxy deploy app-web --target abc123:80");
        assert!(stop < prune && prune < start && start < health && health < register);
    }

    #[tokio::test]
    async fn legacy_proxy_is_removed_after_the_proxy_stops() {
        let executor = ScriptedExecutor::new()
            .on(INSPECT, running_proxy("v0.9.0"))
            .on(HEALTH, ok("health:healthy"))
            .on(RUNNING_WEB, ok("abc123 app-web-latest\n"));
        run(&executor, Operation::Reboot).await;

        let commands = executor.commands_on("1.1.1.1");
        let stop = position(&commands, "docker container stop kamal-proxy");
        let legacy = position(&commands, LEGACY_PROXY_CLEANUP);
        let prune = position(&commands, PROXY_CONTAINER_PRUNE);
        assert_eq!(commands[legacy], LEGACY_PROXY_CLEANUP);
        assert!(stop < legacy && legacy < prune);
    }

    #[tokio::test(start_paused = true)]
    async fn dependent_is_gated_on_the_container_it_runs() {
        let executor = ScriptedExecutor::new()
            .on(
                "label=role=workers --filter status=running",
                ok("w2 app-workers-v2_replaced_20261001000000000\nw1 app-workers-v1\n"),
            )
            .on("'name=^app-workers-v1$' --quiet | xargs", ok("health:healthy"))
            .on(HEALTH, ok(""))
            .on(RUNNING_WEB, ok("abc123 app-web-latest\n"));
        let (report, _) = run(&executor, Operation::Reboot).await;

        assert!(report.is_success(), "{report}");
        assert_eq!(executor.count("'name=^app-workers-v1$'"), 1);
        assert_eq!(executor.count("'name=^app-workers-latest$'"), 0);
        assert_eq!(executor.count("--target abc123:80"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lock_is_released_after_a_failed_gate() {
        let executor = ScriptedExecutor::new().on(HEALTH, ok("health:unhealthy"));
        let (report, _) = run(&executor, Operation::Reboot).await;

        assert!(!report.is_success());
        let commands = executor.commands_on("1.1.1.1");
        let lock = position(&commands, "proxy.lock");
        let health = position(&commands, HEALTH);
        assert!(lock < health);
        assert_eq!(
            commands.last().unwrap(),
            r#"rm -f "$HOME/.local/state/portico/proxy.lock""#
        );
    }

    #[tokio::test]
    async fn parked_containers_are_not_registered() {
        let executor = ScriptedExecutor::new()
            .on(HEALTH, ok("health:healthy"))
            .on(
                RUNNING_WEB,
                ok("old111 app-web-latest_replaced_20261001000000\nabc123 app-web-latest\n"),
            );
        run(&executor, Operation::Reboot).await;

        assert_eq!(executor.count("--target abc123:80"), 1);
        assert_eq!(executor.count("--target old111"), 0);
    }

    #[tokio::test]
    async fn missing_web_container_is_a_warning() {
        let executor = ScriptedExecutor::new().on(HEALTH, ok("state:running"));
        let (report, diagnostics) = run(&executor, Operation::Reboot).await;

        assert!(report.is_success());
        let warnings = diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::MissingTarget);
        assert_eq!(executor.count("kamal-proxy deploy"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_dependent_stops_the_host() {
        let executor = ScriptedExecutor::new().on(HEALTH, ok("health:unhealthy"));
        let (report, _) = run(&executor, Operation::Reboot).await;

        let HostOutcome::Failed(err) = report.outcome("1.1.1.1").unwrap() else {
            panic!("reboot should fail");
        };
        assert_eq!(err.phase(), Phase::HealthGate);
        assert_eq!(err.kind(), ProxyErrorKind::HealthGateFailed);
        assert!(err.to_string().contains("app-workers-latest"));
        assert_eq!(executor.count("kamal-proxy deploy"), 0);
    }
}

mod upgrade {
    use super::*;

    const WEB_ID: &str = "'name=^app-web-latest$' --quiet";
    const RUNNING_WEB: &str = "label=role=web --filter status=running";

    fn upgrade_executor() -> ScriptedExecutor {
        ScriptedExecutor::new()
            .on(INSPECT, running_proxy("v0.9.0"))
            .on(HEALTH, ok("health:healthy"))
            .sequence(WEB_ID, vec![ok("old111\n"), ok("new222222222222\n")])
            .on(
                RUNNING_WEB,
                ok("new222222222222 app-web-latest\nold111 app-web-latest_replaced_20261018120000000\n"),
            )
            .on(
                "label=role=web --filter status=created",
                ok("s1 app-web-a\ns2 app-web-b\ns3 app-web-c\n"),
            )
    }

    #[tokio::test]
    async fn swaps_web_and_retires_the_predecessor() {
        let executor = upgrade_executor();
        let (report, _) = run(&executor, Operation::Upgrade).await;
        assert!(report.is_success(), "{report}");

        let commands = executor.commands_on("1.1.1.1");
        let rename = position(
            &commands,
            "docker rename app-web-latest app-web-latest_replaced_20261018120000000",
        );
        let started = position(&commands, "docker run --detach --restart unless-stopped --name app-web-latest");
        let register = position(&commands, "kamal-proxy deploy app-web --target new222222222:80");
        let retired = position(&commands, "docker container stop old111");
        assert!(rename < started && started < register && register < retired);
    }

    #[tokio::test]
    async fn proxy_is_stopped_pruned_and_restarted() {
        let executor = upgrade_executor();
        run(&executor, Operation::Upgrade).await;

        let commands = executor.commands_on("1.1.1.1");
        let legacy = position(&commands, LEGACY_PROXY_CLEANUP);
        let stop = position(&commands, "docker container stop kamal-proxy");
        let containers = position(&commands, PROXY_CONTAINER_PRUNE);
        let images = position(&commands, PROXY_IMAGE_PRUNE);
        let start = position(&commands, "docker container start kamal-proxy ||");
        assert!(legacy < stop && stop < containers && containers < images && images < start);
    }

    #[tokio::test]
    async fn web_environment_is_written_before_the_container_starts() {
        let executor = upgrade_executor();
        run(&executor, Operation::Upgrade).await;

        let uploads = executor.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.ends_with(r#"cat > "$HOME/.portico/apps/app/env/roles/web.env""#));

        let commands = executor.commands_on("1.1.1.1");
        let written = position(&commands, "env/roles/web.env\"");
        let started = position(&commands, "--name app-web-latest");
        assert!(written < started);
        assert!(commands[started].contains("--env-file"));
    }

    #[tokio::test]
    async fn stopped_containers_beyond_retention_are_removed() {
        let executor = upgrade_executor();
        run(&executor, Operation::Upgrade).await;

        assert_eq!(executor.count("docker container rm s3"), 1);
        assert_eq!(executor.count("container rm s1"), 0);
        assert_eq!(executor.count("docker image prune --force --filter label=service=app"), 1);
        assert_eq!(executor.count("image prune --all --force --filter label=service=app"), 0);
    }

    #[tokio::test]
    async fn dependents_are_not_swapped() {
        let executor = upgrade_executor();
        run(&executor, Operation::Upgrade).await;

        assert_eq!(executor.count("--name app-workers-latest"), 0);
        assert_eq!(executor.count("kamal-proxy deploy app-workers"), 0);
    }

    #[tokio::test]
    async fn outdated_proxy_must_be_rebooted_first() {
        let executor = ScriptedExecutor::new().on(INSPECT, running_proxy("v0.8.7"));
        let (report, _) = run(&executor, Operation::Upgrade).await;

        let HostOutcome::Failed(err) = report.outcome("1.1.1.1").unwrap() else {
            panic!("upgrade should fail");
        };
        assert_eq!(err.kind(), ProxyErrorKind::VersionIncompatible);
        assert_eq!(executor.count("container stop"), 0);
    }
}
