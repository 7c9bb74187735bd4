//! Command line interface for uplugin_release.
//!
//! Parses arguments, maps parse failures onto [`CliError`], sets up logging
//! and hands the selected workflow to [`execute_command`].

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::{CliError, ReleaseError, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};

/// Exit code for bad command line input
pub const USAGE_EXIT_CODE: i32 = 2;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    run_with_args(std::env::args_os()).await
}

/// Run with an explicit argument list (the first item is the binary name)
pub async fn run_with_args<I, T>(itr: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = match Args::try_parse_args(itr) {
        Ok(args) => args,
        Err(err) => return Ok(report_parse_error(&err)),
    };

    init_logging(&args);
    execute_command(args).await
}

/// `RUST_LOG` wins; otherwise `-v`/`-vv` raise the default `warn` level.
fn init_logging(args: &Args) {
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Classify a clap error, print it with usage and return the exit code.
fn report_parse_error(err: &clap::Error) -> i32 {
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        let _ = err.print();
        return 0;
    }

    let output = OutputManager::new(false, false);
    output.error(&classify_parse_error(err).to_string());
    output.error_plain(&err.render().to_string());
    USAGE_EXIT_CODE
}

/// Invalid or missing values become [`CliError::MissingConfiguration`];
/// everything else is an unknown argument.
pub fn classify_parse_error(err: &clap::Error) -> ReleaseError {
    match err.kind() {
        ErrorKind::InvalidValue
        | ErrorKind::ValueValidation
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => CliError::MissingConfiguration {
            argument: context_text(err, ContextKind::InvalidArg)
                .or_else(|| context_text(err, ContextKind::InvalidSubcommand))
                .unwrap_or_else(|| "<COMMAND>".to_string()),
            allowed: context_text(err, ContextKind::ValidValue)
                .or_else(|| context_text(err, ContextKind::ValidSubcommand))
                .unwrap_or_else(|| "see --help".to_string()),
        }
        .into(),
        _ => CliError::UnknownArgument {
            reason: context_text(err, ContextKind::InvalidArg)
                .or_else(|| context_text(err, ContextKind::InvalidSubcommand))
                .unwrap_or_else(|| format!("{:?}", err.kind())),
        }
        .into(),
    }
}

fn context_text(err: &clap::Error, kind: ContextKind) -> Option<String> {
    match err.get(kind)? {
        ContextValue::String(value) => Some(value.clone()),
        ContextValue::Strings(values) if !values.is_empty() => Some(values.join(", ")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(argv: &[&str]) -> clap::Error {
        Args::try_parse_args(argv.iter().copied()).unwrap_err()
    }

    #[test]
    fn test_unknown_flag_classified() {
        let err = classify_parse_error(&parse_err(&["uplugin_release", "stage", "--bogus"]));
        assert!(matches!(
            err,
            ReleaseError::Cli(CliError::UnknownArgument { ref reason }) if reason == "--bogus"
        ));
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_invalid_platform_classified() {
        let err = classify_parse_error(&parse_err(&["uplugin_release", "ndk", "-p", "Linux"]));
        match err {
            ReleaseError::Cli(CliError::MissingConfiguration { argument, allowed }) => {
                assert!(argument.contains("--platform"));
                assert!(allowed.contains("Win64-ndk-dll"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_classified() {
        let err = classify_parse_error(&parse_err(&["uplugin_release", "marketplace", "-p", "Mac"]));
        assert!(matches!(
            err,
            ReleaseError::Cli(CliError::MissingConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_parse_failure_exit_code() {
        let code = run_with_args(["uplugin_release", "--nope"]).await.unwrap();
        assert_eq!(code, USAGE_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_help_exits_zero() {
        let code = run_with_args(["uplugin_release", "--help"]).await.unwrap();
        assert_eq!(code, 0);
    }
}
