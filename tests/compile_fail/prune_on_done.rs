// ABOUTME: Compile-fail test verifying a finished rollout cannot be pruned again.
// ABOUTME: This test should fail to compile, validating state machine safety.

use portico::deploy::{Done, Rollout};

async fn try_invalid_prune(rollout: Rollout<'_, Done>) {
    // ERROR: prune() doesn't exist on Rollout<Done>
    let _ = rollout.prune().await;
}

fn main() {}
