use std::io::{self, BufRead, Write};

use console::style;

use crate::error::{ReleaseError, Result};

/// Terminal front end for the release commands.
///
/// Progress and warnings go to stderr so stdout stays clean for rendered
/// output that callers may want to pipe somewhere else.
#[derive(Debug, Clone)]
pub struct Console {
    /// When set, `confirm` answers yes without prompting.
    pub assume_yes: bool,
    /// Suppresses progress chatter; warnings and errors still print.
    pub quiet: bool,
}

impl Console {
    pub fn new(assume_yes: bool) -> Console {
        Console {
            assume_yes,
            quiet: false,
        }
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", style("Error:").red().bold(), msg);
    }

    /// Writes to stdout, for rendered content rather than progress chatter.
    pub fn out(&self, msg: &str) {
        println!("{}", msg);
    }

    /// Asks a yes/no question. Returns true when the user types `y` or
    /// `yes` (case-insensitive), or unconditionally when `assume_yes` is set.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        eprint!("{} [y/N]: ", style(prompt).cyan());
        io::stderr().flush()?;

        let answer = read_line()?;
        let answer = answer.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    /// Puts `content` on the system clipboard, falling back to stdout when
    /// no clipboard is available (headless CI, SSH sessions).
    pub fn clipboard_or_print(&self, content: &str) {
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(content.to_string())) {
            Ok(()) => self.info("Copied to clipboard."),
            Err(_) => {
                self.warn("Clipboard unavailable, printing instead.");
                self.out(content);
            }
        }
    }
}

fn read_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| ReleaseError::config(format!("could not read stdin: {}", e)))?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_skips_the_prompt() {
        let console = Console::new(true);
        assert!(console.confirm("Continue?").unwrap());
    }
}
