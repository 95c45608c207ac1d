// ABOUTME: Compile-fail test verifying targets cannot be swapped before the version check.
// ABOUTME: This test should fail to compile, validating state machine safety.

use portico::deploy::{Idle, Rollout};

async fn try_invalid_swap(rollout: Rollout<'_, Idle>) {
    // ERROR: swap_targets() doesn't exist on Rollout<Idle>
    let _ = rollout.swap_targets().await;
}

fn main() {}
