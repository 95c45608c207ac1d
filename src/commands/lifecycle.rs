// ABOUTME: Boot, reboot and upgrade command handlers.
// ABOUTME: Builds a deployment plan and runs it across the fleet with hooks.

use super::Context;
use portico::deploy::{DeploymentPlan, Mode, Operation, deploy_proxy};
use portico::error::Result;
use portico::hooks::HookRunner;

pub async fn deploy(mut ctx: Context, operation: Operation, mode: Mode) -> Result<()> {
    let plan = DeploymentPlan::build(&ctx.config, operation, mode)?;

    ctx.output.start_timer();
    ctx.output.progress(&format!(
        "{} {} on {} host(s) ({})",
        title(operation),
        plan.proxy_image,
        plan.hosts.len(),
        mode.as_str()
    ));

    let hooks = HookRunner::new(&ctx.project_dir);
    let report = deploy_proxy(&ctx.fleet(), &plan, Some(&hooks)).await;

    ctx.finish(title(operation), report).await
}

fn title(operation: Operation) -> &'static str {
    match operation {
        Operation::Boot => "Booting",
        Operation::Reboot => "Rebooting",
        Operation::Upgrade => "Upgrading",
    }
}
