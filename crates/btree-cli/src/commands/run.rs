//! Step a tree and print its status after every step.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use behavior_tree::{BehaviorTreeLibrary, Status, SubtreeSource, TracingListener};
use clap::Parser;
use console::style;
use tracing::info;

use crate::config::CliConfig;

#[derive(Parser)]
pub struct Run {
    /// Tree reference, resolved against the base directory
    #[arg(value_name = "REFERENCE")]
    reference: String,

    /// Number of steps (overrides config)
    #[arg(short, long)]
    steps: Option<u32>,

    /// Seconds the clock advances before each step (overrides config)
    #[arg(short, long)]
    delta: Option<f32>,

    /// Seed for random decisions (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Keep stepping after the tree finishes
    #[arg(long)]
    keep_going: bool,

    /// Log every task status change at debug level
    #[arg(short, long)]
    trace_tasks: bool,
}

impl Run {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let steps = self.steps.unwrap_or(config.run.steps);
        let delta = self.delta.unwrap_or(config.run.delta);
        let seed = self.seed.or(config.run.seed);

        let mut library = config.library.build_library::<()>();
        let mut tree = library
            .create_behavior_tree(&self.reference, Some(()))
            .with_context(|| format!("load tree {}", self.reference))?;
        if let Some(seed) = seed {
            tree.reseed(seed);
        }
        let subtrees: Arc<dyn SubtreeSource<()>> = Arc::new(Mutex::new(
            BehaviorTreeLibrary::<()>::with_parser(config.library.parser(), config.library.resolver()),
        ));
        tree.set_subtree_source(Some(subtrees));
        tree.set_semaphores(Some(config.run.semaphore_repository()));
        if self.trace_tasks {
            tree.add_listener(TracingListener);
        }

        info!(reference = %self.reference, steps, delta, ?seed, "running behavior tree");
        for step in 1..=steps {
            tree.update(delta)
                .with_context(|| format!("step {step} of {}", self.reference))?;
            let status = tree.status();
            println!(
                "{} {:>4}  {}",
                style("step").dim(),
                step,
                styled_status(status)
            );
            if status.is_terminal() && !self.keep_going {
                break;
            }
        }

        library.dispose_behavior_tree(&self.reference, tree);
        Ok(())
    }
}

fn styled_status(status: Status) -> console::StyledObject<&'static str> {
    let text = status.as_str();
    match status {
        Status::Succeeded => style(text).green(),
        Status::Failed => style(text).red(),
        Status::Running => style(text).yellow(),
        Status::Cancelled => style(text).magenta(),
        Status::Fresh => style(text).dim(),
    }
}
