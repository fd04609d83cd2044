//! Console and log-file output for the zile CLI
//!
//! Library crates report through `tracing`; this crate is what the user sees.
//! Every message is also appended to `zile.log` in the user's config directory
//! so that a failed build can be inspected after the fact.

use colored::Colorize;
use indicatif::ProgressBar;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const LOG_FILE_NAME: &str = "zile.log";

struct State {
    log_file: Option<PathBuf>,
    verbosity: u8,
    spinner: Option<ProgressBar>,
}

static STATE: Mutex<State> = Mutex::new(State {
    log_file: None,
    verbosity: 0,
    spinner: None,
});

fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> Option<R> {
    STATE.lock().ok().map(|mut state| f(&mut state))
}

/// Current verbosity level
/// 0 = warnings only, 1 = debug (-v), 2 = trace (-vv)
pub fn verbosity() -> u8 {
    with_state(|s| s.verbosity).unwrap_or(0)
}

/// Initialize the logger, writing the log file into the default config directory
pub fn init(verbosity: u8) -> Result<(), String> {
    let dir = default_log_dir()?;
    init_in(verbosity, &dir)
}

/// Initialize the logger with an explicit log directory
pub fn init_in(verbosity: u8, dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let log_file = dir.join(LOG_FILE_NAME);

    // One log per run
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }

    with_state(|s| {
        s.verbosity = verbosity;
        s.log_file = Some(log_file);
    })
    .ok_or_else(|| "Logger state is poisoned".to_string())
}

fn default_log_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config")
        .join("zile");

    #[cfg(target_os = "windows")]
    let dir = dirs::config_dir()
        .ok_or("Could not determine config directory")?
        .join("zile");

    Ok(dir)
}

fn write_to_log(level: &str, message: &str) {
    let Some(Some(path)) = with_state(|s| s.log_file.clone()) else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {} {}", timestamp, level, message);
    }
}

/// Informational message, shown on the console with `-v`
pub fn info(message: &str) {
    write_to_log("INFO", message);
    if verbosity() >= 1 {
        eprintln!("{}", message);
    }
}

/// Debug message, shown on the console with `-v`
pub fn debug(message: &str) {
    write_to_log("DEBUG", message);
    if verbosity() >= 1 {
        eprintln!("{} {}", "DEBUG:".blue().bold(), message);
    }
}

/// Trace-level step marker, shown on the console with `-vv`
pub fn step(message: &str) {
    write_to_log("STEP", message);
    if verbosity() >= 2 {
        eprintln!("{} {}", "TRACE:".dimmed(), message);
    }
}

pub fn warn(message: &str) {
    write_to_log("WARN", message);
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn error(message: &str) {
    write_to_log("ERROR", message);
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Progress headline such as "→ Building package at ..."
pub fn progress(message: &str) {
    write_to_log("INFO", message);
    eprintln!("{} {}", "→".cyan().bold(), message);
}

pub fn success(message: &str) {
    write_to_log("SUCCESS", message);
    eprintln!("{} {}", "✔".green().bold(), message);
}

/// Record the output of an external command in the log file
pub fn capture_output(command_name: &str, code: Option<i32>, output: &str) {
    write_to_log(
        "COMMAND",
        &format!("{} (exit code: {:?})", command_name, code),
    );
    if !output.trim().is_empty() {
        write_to_log("OUTPUT", &format!("\n{}", output.trim_end()));
    }
}

/// Path of the active log file, if the logger was initialized
pub fn log_path() -> Option<PathBuf> {
    with_state(|s| s.log_file.clone()).flatten()
}

/// Start a spinner with the given message (skipped when verbose)
pub fn spinner_start(message: &str) {
    if verbosity() > 0 {
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message.to_string());

    with_state(|s| s.spinner = Some(spinner));
}

/// Clear the spinner without printing anything
pub fn spinner_stop() {
    if let Some(Some(spinner)) = with_state(|s| s.spinner.take()) {
        spinner.finish_and_clear();
    }
}

pub fn spinner_success(message: &str) {
    spinner_stop();
    success(message);
}

pub fn spinner_error(message: &str) {
    spinner_stop();
    write_to_log("ERROR", message);
    eprintln!("  {} {}", "✗".red().bold(), message);
}
