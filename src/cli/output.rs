//! Colored terminal output for release workflows
//!
//! Progress and results go to stdout, errors always go to stderr.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    /// Print `symbol` in `color`, then the message (optionally tinted too)
    fn tagged(&self, symbol: &str, color: Color, bold: bool, tint_message: bool, message: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = write!(&mut buffer, "{}", symbol);
        let _ = buffer.reset();
        if tint_message {
            let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)));
        }
        let _ = writeln!(&mut buffer, " {}", message);
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) {
        self.tagged("ℹ", Color::Cyan, false, false, message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.tagged("✓", Color::Green, true, false, message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.tagged("⚠", Color::Yellow, true, true, message);
    }

    /// Print a progress message, one per workflow step
    pub fn progress(&self, message: &str) {
        self.tagged("⋯", Color::Magenta, false, false, message);
    }

    /// Print a verbose/debug message (only in verbose mode)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.tagged("→", Color::Blue, false, false, message);
        }
    }

    /// Print an error message (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();

        if buffer
            .set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))
            .is_err()
            || write!(&mut buffer, "✗").is_err()
            || buffer.reset().is_err()
            || buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red))).is_err()
            || writeln!(&mut buffer, " {}", message).is_err()
            || buffer.reset().is_err()
            || bufwtr.print(&buffer).is_err()
        {
            eprintln!("✗ {}", message);
        }
    }

    /// Print plain text to stderr (always shown), e.g. usage
    pub fn error_plain(&self, message: &str) {
        eprintln!("{}", message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }

        let mut buffer = self.bufwtr.buffer();
        let _ = writeln!(&mut buffer);
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = writeln!(&mut buffer, "═══ {} ═══", title);
        let _ = buffer.reset();
        let _ = self.bufwtr.print(&buffer);
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        if !self.quiet {
            let mut buffer = self.bufwtr.buffer();
            let _ = writeln!(&mut buffer, "    {}", message);
            let _ = self.bufwtr.print(&buffer);
        }
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) {
        if !self.quiet {
            let mut buffer = self.bufwtr.buffer();
            let _ = writeln!(&mut buffer, "{}", message);
            let _ = self.bufwtr.print(&buffer);
        }
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
