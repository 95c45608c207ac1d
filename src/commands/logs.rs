// ABOUTME: Proxy logs command handler.
// ABOUTME: Fetches logs from every host, or streams from the first host over an interactive ssh.

use super::Context;
use portico::command::LogOptions;
use portico::error::{Error, Result};
use portico::exec::ExecError;
use portico::types::Host;
use tokio::process::Command;

pub async fn logs(ctx: Context, options: LogOptions) -> Result<()> {
    let hosts = ctx.config.hosts();

    if options.follow {
        let Some(host) = hosts.first() else {
            return Ok(());
        };
        ctx.executor.disconnect_all(&ctx.diagnostics).await;
        return follow(&ctx, host, &options).await;
    }

    let fleet = ctx.fleet();
    let mut failed = 0;
    for host in &hosts {
        let cmd = fleet.proxy_commands(host).logs(&options);
        match fleet.executor.capture(host, &cmd).await {
            Ok(lines) => ctx.output.host_section("Proxy Host", &host.to_string(), &lines),
            Err(e) => {
                failed += 1;
                ctx.output.error(&e.to_string());
            }
        }
    }

    ctx.executor.disconnect_all(&ctx.diagnostics).await;
    ctx.output.warnings(&ctx.diagnostics);

    if failed > 0 {
        return Err(Error::HostsFailed {
            failed,
            total: hosts.len(),
        });
    }
    Ok(())
}

/// Hand the terminal to a local `ssh -t` so the stream ends with Ctrl-C.
async fn follow(ctx: &Context, host: &Host, options: &LogOptions) -> Result<()> {
    let cmd = ctx.fleet().proxy_commands(host).logs(options);
    let destination = match host.ssh_user() {
        Some(user) => format!("{user}@{}", host.address()),
        None => host.address().to_string(),
    };

    tracing::debug!(host = %host, command = %cmd, "streaming logs");

    let status = Command::new("ssh")
        .arg("-t")
        .arg("-p")
        .arg(host.ssh_port().to_string())
        .arg(destination)
        .arg(cmd.to_shell())
        .status()
        .await?;

    if !status.success() {
        return Err(Error::Exec(ExecError::NonZeroExit {
            host: host.to_string(),
            command: cmd.redacted(),
            exit_code: status.code().map_or(255, |code| code as u32),
            stderr: String::new(),
        }));
    }
    Ok(())
}
