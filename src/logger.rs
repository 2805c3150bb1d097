//! Terminal output: prefixed log lines and build progress.
//!
//! ```text
//! [build] 4 projects, 17 assets
//! [projects] ████████░░░░░░░░ 2/4
//! [assets]   ████████████████ 17/17
//! ```
//!
//! While progress bars are on screen, log lines are printed above them and
//! the bars are redrawn underneath.

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, queue,
    terminal::{self, Clear, ClearType},
};
use std::{
    io::{StdoutLock, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Rows currently occupied by progress bars.
static BAR_ROWS: AtomicUsize = AtomicUsize::new(0);

static TERM_WIDTH: OnceLock<usize> = OnceLock::new();

const FALLBACK_WIDTH: usize = 100;
const BAR_WIDTH: (usize, usize) = (10, 32);

fn term_width() -> usize {
    *TERM_WIDTH.get_or_init(|| {
        terminal::size()
            .map(|(w, _)| usize::from(w))
            .unwrap_or(FALLBACK_WIDTH)
    })
}

/// Log a message with a colored module prefix.
///
/// ```ignore
/// log!("build"; "{} projects", count);
/// log!("warn"; "unsupported video source `{}`", url);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// `[module]` in the color of its kind of message.
fn prefix(module: &str) -> ColoredString {
    let tag = format!("[{module}]");
    match module {
        "error" => tag.bright_red().bold(),
        "warn" => tag.bright_magenta().bold(),
        "serve" => tag.bright_blue().bold(),
        "watch" => tag.bright_green().bold(),
        _ => tag.bright_yellow().bold(),
    }
}

/// Cut `s` to at most `max` characters.
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Write one log line; single-line messages are clipped to the terminal.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    let rows = BAR_ROWS.load(Ordering::SeqCst);
    lift_above_bars(&mut out, rows);

    let room = term_width().saturating_sub(module.chars().count() + 3);
    let text = if message.contains('\n') {
        message
    } else {
        clip(message, room)
    };
    writeln!(out, "{} {text}", prefix(module)).ok();

    // Leave blank rows for the bars to be redrawn into.
    for _ in 0..rows {
        writeln!(out).ok();
    }
    out.flush().ok();
}

fn lift_above_bars(out: &mut StdoutLock<'_>, rows: usize) {
    if rows == 0 {
        queue!(out, Clear(ClearType::UntilNewLine)).ok();
        return;
    }
    queue!(
        out,
        cursor::MoveUp(rows_u16(rows)),
        Clear(ClearType::FromCursorDown)
    )
    .ok();
}

fn rows_u16(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

// ============================================================================
// Progress
// ============================================================================

struct Bar {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl Bar {
    fn line(&self, label_width: usize) -> String {
        let done = self.done.load(Ordering::Relaxed).min(self.total);
        let count = format!("{done}/{}", self.total);
        let overhead = label_width + 2 + 1 + 1 + count.len();
        let width = term_width()
            .saturating_sub(overhead)
            .clamp(BAR_WIDTH.0, BAR_WIDTH.1);
        let filled = if self.total == 0 {
            width
        } else {
            done * width / self.total
        };

        let pad = " ".repeat(label_width - self.label.len());
        format!(
            "{}{pad} {}{} {count}",
            prefix(self.label),
            "█".repeat(filled),
            "░".repeat(width - filled)
        )
    }
}

/// One bar per build category, redrawn together under the log output.
///
/// Updates arrive from rayon workers; drawing is serialized by `draw`.
pub struct ProgressBars {
    bars: Vec<Bar>,
    label_width: usize,
    draw: Mutex<()>,
}

impl ProgressBars {
    /// Bars for the categories that have work; `None` when there is at most
    /// one item in total.
    pub fn new_filtered(categories: &[(&'static str, usize)]) -> Option<Self> {
        let bars: Vec<Bar> = categories
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(label, total)| Bar {
                label,
                total,
                done: AtomicUsize::new(0),
            })
            .collect();
        if bars.iter().map(|b| b.total).sum::<usize>() <= 1 {
            return None;
        }

        let label_width = bars.iter().map(|b| b.label.len()).max().unwrap_or(0);
        let mut out = stdout().lock();
        for _ in &bars {
            writeln!(out).ok();
        }
        out.flush().ok();
        BAR_ROWS.store(bars.len(), Ordering::SeqCst);

        Some(Self {
            bars,
            label_width,
            draw: Mutex::new(()),
        })
    }

    /// Count one finished item of `label` and redraw.
    pub fn inc_by_name(&self, label: &str) {
        if let Some(bar) = self.bars.iter().find(|b| b.label == label) {
            bar.done.fetch_add(1, Ordering::Relaxed);
            self.redraw();
        }
    }

    fn redraw(&self) {
        let _guard = self.draw.lock().ok();
        let mut out = stdout().lock();
        queue!(out, cursor::MoveUp(rows_u16(self.bars.len()))).ok();
        for bar in &self.bars {
            queue!(out, Clear(ClearType::CurrentLine)).ok();
            writeln!(out, "\r{}", bar.line(self.label_width)).ok();
        }
        out.flush().ok();
    }

    /// Erase the bars; later calls are no-ops.
    pub fn finish(&self) {
        let rows = BAR_ROWS.swap(0, Ordering::SeqCst);
        if rows == 0 {
            return;
        }
        let _guard = self.draw.lock().ok();
        let mut out = stdout().lock();
        queue!(
            out,
            cursor::MoveUp(rows_u16(rows)),
            Clear(ClearType::FromCursorDown)
        )
        .ok();
        out.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip("hello", 10), "hello");
        assert_eq!(clip("hello world", 5), "hello");
        assert_eq!(clip("héllo", 2), "hé");
        assert_eq!(clip("abc", 0), "");
    }

    #[test]
    fn test_new_filtered_skips_trivial_work() {
        assert!(ProgressBars::new_filtered(&[("projects", 1), ("assets", 0)]).is_none());
        assert!(ProgressBars::new_filtered(&[("projects", 0), ("assets", 0)]).is_none());
    }

    #[test]
    fn test_bar_line() {
        let bar = Bar {
            label: "assets",
            total: 4,
            done: AtomicUsize::new(2),
        };
        let line = bar.line("projects".len());
        assert!(line.ends_with(" 2/4"));
        assert!(line.contains('█'));
        assert!(line.contains('░'));
    }

    #[test]
    fn test_bar_line_caps_overflow() {
        let bar = Bar {
            label: "projects",
            total: 2,
            done: AtomicUsize::new(5),
        };
        let line = bar.line(8);
        assert!(line.ends_with(" 2/2"));
        assert!(!line.contains('░'));
    }
}
