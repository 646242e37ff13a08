//! Terminal lifecycle management.
//!
//! Terminal state is restored on normal exit (via Drop) and on panic (via
//! the hook from [`install_panic_hook`]).

use std::io::{self, Stdout, Write};
use std::panic;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Print, ResetColor};
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{execute, queue};

/// The full-screen view. Dropping it gives the terminal back.
pub struct Screen {
    stdout: Stdout,
}

impl Screen {
    /// Enable raw mode, switch to the alternate screen and hide the cursor.
    ///
    /// Call [`install_panic_hook`] first so a panic restores the terminal.
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))
            .context("Failed to enter alternate screen")?;
        Ok(Self { stdout })
    }

    /// Replace the screen contents with `lines`, one per row.
    pub fn draw(&mut self, lines: &[String]) -> Result<()> {
        queue!(self.stdout, BeginSynchronizedUpdate)?;
        for (row, line) in lines.iter().enumerate() {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            queue!(
                self.stdout,
                MoveTo(0, row),
                Print(line),
                ResetColor,
                Clear(ClearType::UntilNewLine)
            )?;
        }
        queue!(
            self.stdout,
            Clear(ClearType::FromCursorDown),
            EndSynchronizedUpdate
        )?;
        self.stdout.flush().context("Failed to draw frame")
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal() {
            log::error!("Failed to restore terminal: {e:#}");
        }
    }
}

/// Leave the alternate screen and raw mode. Safe to call more than once.
pub fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), Show, LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
