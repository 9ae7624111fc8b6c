//! Output mode flags and terminal styling shared by all subcommands.

use std::io::IsTerminal;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
}

static MODE: OnceLock<OutputMode> = OnceLock::new();

/// Set the process-wide output mode. Later calls are ignored.
pub fn init(mode: OutputMode) {
    let _ = MODE.set(mode);
}

fn mode() -> OutputMode {
    MODE.get().copied().unwrap_or_default()
}

/// Machine-readable output requested.
pub fn is_json() -> bool {
    mode().json
}

/// Non-essential output suppressed. JSON mode implies quiet.
pub fn is_quiet() -> bool {
    let m = mode();
    m.quiet || m.json
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// Status symbols, coloured when stderr is a terminal.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            color: !mode().no_color
                && std::env::var_os("NO_COLOR").is_none()
                && std::io::stderr().is_terminal(),
        }
    }

    fn paint(&self, code: &str, sym: &'static str) -> String {
        if self.color {
            format!("\x1b[{code}m{sym}\x1b[0m")
        } else {
            sym.to_string()
        }
    }

    pub fn ok_sym(&self) -> String {
        self.paint("32", "✓")
    }

    pub fn warn_sym(&self) -> String {
        self.paint("33", "!")
    }

    pub fn fail_sym(&self) -> String {
        self.paint("31", "✗")
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}
