// ABOUTME: Proxy container control, inspection and removal handlers.
// ABOUTME: Each runs on every host in parallel and reports per host.

use super::Context;
use portico::deploy;
use portico::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub enum Control {
    Start,
    Stop,
    Restart,
    RemoveContainer,
    RemoveImage,
    RemoveHostDirectory,
}

impl Control {
    fn title(self) -> &'static str {
        match self {
            Control::Start => "Starting proxy",
            Control::Stop => "Stopping proxy",
            Control::Restart => "Restarting proxy",
            Control::RemoveContainer => "Removing proxy containers",
            Control::RemoveImage => "Removing proxy images",
            Control::RemoveHostDirectory => "Removing proxy directory",
        }
    }
}

pub async fn control(ctx: Context, action: Control) -> Result<()> {
    let hosts = ctx.config.hosts();
    let report = {
        let fleet = ctx.fleet();
        match action {
            Control::Start => deploy::start(&fleet, &hosts).await,
            Control::Stop => deploy::stop(&fleet, &hosts).await,
            Control::Restart => deploy::restart(&fleet, &hosts).await,
            Control::RemoveContainer => deploy::remove_container(&fleet, &hosts).await,
            Control::RemoveImage => deploy::remove_image(&fleet, &hosts).await,
            Control::RemoveHostDirectory => deploy::remove_host_directory(&fleet, &hosts).await,
        }
    };

    ctx.finish(action.title(), Ok(report)).await
}

pub async fn remove(ctx: Context, force: bool) -> Result<()> {
    let hosts = ctx.config.hosts();
    ctx.output.progress(&format!("Removing proxy from {} host(s)", hosts.len()));

    let report = deploy::remove(&ctx.fleet(), &hosts, force).await;
    ctx.finish("Removing proxy", Ok(report)).await
}

pub async fn details(ctx: Context) -> Result<()> {
    let hosts = ctx.config.hosts();
    let results = deploy::details(&ctx.fleet(), &hosts).await;

    let mut failed = 0;
    for (host, result) in &results {
        match result {
            Ok(info) => ctx.output.host_section("Proxy Host", &host.to_string(), info),
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
            total: results.len(),
        });
    }
    Ok(())
}
