//! Command execution functions for every release workflow.
//!
//! Each workflow runs its steps strictly in order and stops at the first
//! failure; this module turns the outcome into user output and an exit code.

mod format;
mod marketplace;
mod ndk;
mod stage;
mod test;

use crate::cli::{Args, Command, OutputManager, RuntimeConfig, USAGE_EXIT_CODE};
use crate::error::{ReleaseError, Result};
use clap::CommandFactory;

use format::execute_format;
use marketplace::execute_marketplace;
use ndk::{NdkActions, execute_ndk};
use stage::execute_stage;
use test::execute_test;

/// Execute the selected workflow, returning the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    let config = match RuntimeConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            let output = OutputManager::new(args.verbose > 0, args.quiet);
            return Ok(report_failure(&output, &args.command, &e));
        }
    };

    let result = match &args.command {
        Command::Stage { archive, output } => {
            execute_stage(&config, *archive, output.as_deref()).await
        }
        Command::Ndk {
            platform,
            clean,
            build,
            copy,
        } => {
            let actions = NdkActions {
                clean: *clean,
                build: *build,
                copy: *copy,
            };
            execute_ndk(&config, *platform, actions).await
        }
        Command::Marketplace {
            platform,
            unreal,
            binaries,
            keep_temp,
        } => execute_marketplace(&config, *platform, *unreal, *binaries, *keep_temp).await,
        Command::Format => execute_format(&config).await,
        Command::Test {
            platform,
            unreal,
            filter,
        } => execute_test(&config, *platform, *unreal, filter.as_deref()).await,
    };

    match result {
        Ok(()) => {
            if !config.is_quiet() {
                config.success_println(&format!(
                    "Command '{}' completed successfully",
                    args.command.name()
                ));
            }
            Ok(0)
        }
        Err(e) => Ok(report_failure(config.output(), &args.command, &e)),
    }
}

/// Print the failure and pick the exit code: usage errors also print the
/// subcommand usage and exit with [`USAGE_EXIT_CODE`].
fn report_failure(output: &OutputManager, command: &Command, e: &ReleaseError) -> i32 {
    output.error(&format!("Command '{}' failed: {}", command.name(), e));

    if output.is_verbose() {
        let suggestions = e.recovery_suggestions();
        if !suggestions.is_empty() {
            output.println("\n💡 Recovery suggestions:");
            for suggestion in suggestions {
                output.indent(&suggestion);
            }
        }
    }

    if e.is_usage_error() {
        if let Some(usage) = subcommand_usage(command.name()) {
            output.error_plain(&usage);
        }
        USAGE_EXIT_CODE
    } else {
        1
    }
}

fn subcommand_usage(name: &str) -> Option<String> {
    let mut cmd = Args::command();
    cmd.build();
    cmd.find_subcommand_mut(name)
        .map(|sub| sub.render_usage().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommand_usage_names_flags() {
        let usage = subcommand_usage("ndk").unwrap();
        assert!(usage.contains("ndk"));
        assert!(subcommand_usage("missing").is_none());
    }
}
