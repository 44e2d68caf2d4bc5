//! End-of-run pause for interactive sessions.
use anyhow::{Context, Result};
use std::io::{self, IsTerminal, Write};

const PAUSE_PROMPT: &str = "Press Enter to continue...";

/// Whether the pause should block: only when asked for and attached to a terminal.
pub fn should_pause(interactive: bool, attached_to_terminal: bool) -> bool {
    interactive && attached_to_terminal
}

/// Wait for the user to press Enter so console output can be read.
pub fn pause_for_acknowledgment(interactive: bool) -> Result<()> {
    let attached = io::stdin().is_terminal() && io::stdout().is_terminal();
    if !should_pause(interactive, attached) {
        if interactive {
            tracing::debug!("not attached to a terminal; skipping pause");
        }
        return Ok(());
    }
    let mut stdout = io::stdout();
    write!(stdout, "{PAUSE_PROMPT}").context("write pause prompt")?;
    stdout.flush().context("flush pause prompt")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("read acknowledgment")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_requires_interactive_mode_and_terminal() {
        assert!(should_pause(true, true));
        assert!(!should_pause(true, false));
        assert!(!should_pause(false, true));
    }
}
