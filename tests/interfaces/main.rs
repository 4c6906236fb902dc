//! Interface tests for the evolution rules using Cucumber.
//!
//! Each scenario plays an old binary, a recompiled binary, or the loader
//! against the reference library's exported entry points:
//!
//! ```bash
//! cargo test --test interfaces
//! ```

mod steps;

use cucumber::World;
use steps::evolution::EvolutionWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Evolution Interface Tests ===\n");
    EvolutionWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/interfaces/features/evolution.feature")
        .await;
}
