//! uplugin_release - release tooling for Unreal Engine plugin repositories.
//!
//! Stages release trees, builds the native SDK and packages the plugin for
//! the marketplace by driving external build tools.

use std::process;
use uplugin_release::cli;
use uplugin_release::cli::OutputManager;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Create output manager for error display (never quiet for fatal errors)
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));

            let suggestions = e.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\n💡 Recovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            process::exit(1);
        }
    }
}
