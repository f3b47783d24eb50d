//! Parse trees and print their structure.

use anyhow::{Result, bail};
use behavior_tree::parser::describe;
use clap::Parser;
use console::style;

use crate::config::CliConfig;

#[derive(Parser)]
pub struct Check {
    /// Tree references, resolved against the base directory
    #[arg(value_name = "REFERENCE", required = true)]
    references: Vec<String>,

    /// Only report failures
    #[arg(short, long)]
    quiet: bool,
}

impl Check {
    pub fn execute(self, config: &CliConfig) -> Result<()> {
        let mut library = config.library.build_library::<()>();
        let mut failures = 0;

        for reference in &self.references {
            match library.retrieve_archetype_tree(reference) {
                Ok(tree) => {
                    if self.quiet {
                        continue;
                    }
                    println!("{} {}", style("ok").bold().green(), style(reference).cyan());
                    if let Some(root) = tree.root() {
                        for line in describe(root).lines() {
                            println!("  {line}");
                        }
                    }
                }
                Err(err) => {
                    failures += 1;
                    println!("{} {}", style("error").bold().red(), style(reference).cyan());
                    let mut source: Option<&dyn std::error::Error> = Some(&err);
                    while let Some(cause) = source {
                        println!("  {cause}");
                        source = cause.source();
                    }
                }
            }
        }

        if failures > 0 {
            bail!("{failures} of {} trees failed to load", self.references.len());
        }
        Ok(())
    }
}
