//! Terminal logging with colored module prefixes.
//!
//! The `log!` macro prints a `[module]` prefix colored by module kind
//! followed by a formatted message. `Progress` draws a single in-place
//! progress line for the parallel render phase.

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("build"; "rendered {} pages", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::utils::log::log($module, &format!($($arg)*))
    }};
}

/// Print `[module] message`, truncated to the terminal width.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    // "[module] " overhead
    let max_msg_len = terminal_width().saturating_sub(module.len() + 3);
    let message = truncate_str(message, max_msg_len);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module kind.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" | "skip" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single-line progress indicator for a batch of items.
///
/// Thread-safe: `inc` may be called from rayon workers. The line is
/// redrawn in place with `\r` and cleared by `finish`.
pub struct Progress {
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
}

impl Progress {
    const BAR_WIDTH: usize = 30;

    pub fn new(module: &'static str, total: usize) -> Self {
        Self {
            prefix: colorize_prefix(module),
            total,
            current: AtomicUsize::new(0),
        }
    }

    /// Increment and redraw. A no-op when total is zero.
    pub fn inc(&self) {
        if self.total == 0 {
            return;
        }
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let filled = (current * Self::BAR_WIDTH) / self.total;
        let bar: String =
            "█".repeat(filled.min(Self::BAR_WIDTH)) + &"░".repeat(Self::BAR_WIDTH.saturating_sub(filled));

        let mut stdout = stdout().lock();
        write!(stdout, "\r{} [{bar}] {current}/{}", self.prefix, self.total).ok();
        stdout.flush().ok();
    }

    /// Clear the progress line.
    pub fn finish(&self) {
        let mut stdout = stdout().lock();
        write!(stdout, "\r").ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_unchanged() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn truncate_cuts_at_limit() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn truncate_respects_utf8_boundaries() {
        // "你" is 3 bytes; cutting at 4 must fall back to 3
        assert_eq!(truncate_str("你好", 4), "你");
        assert_eq!(truncate_str("你好", 6), "你好");
        assert_eq!(truncate_str("a你b", 3), "a");
    }

    #[test]
    fn progress_zero_total_is_noop() {
        let progress = Progress::new("render", 0);
        progress.inc();
        assert_eq!(progress.current.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn progress_counts_increments() {
        let progress = Progress::new("render", 1000);
        for _ in 0..3 {
            progress.inc();
        }
        assert_eq!(progress.current.load(Ordering::Relaxed), 3);
        progress.finish();
    }
}
