//! Console abstraction for the conversation.
//!
//! The session only talks to the user through [`Console`], so tests can feed
//! scripted answers and inspect everything that was shown.

use colored::Colorize;
use std::io::{self, BufRead, Write};

pub trait Console {
    /// Shows `prompt` and reads one line of input.
    ///
    /// Returns `Ok(None)` once input is exhausted. The trailing newline is
    /// stripped; no other normalization happens here.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Shows a message to the user.
    fn show(&mut self, text: &str);
}

/// Console over stdin/stdout, highlighting everything the coach says in green.
pub struct TerminalConsole<R = io::StdinLock<'static>, W = io::Stdout> {
    input: R,
    output: W,
}

impl TerminalConsole {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt.green())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    fn show(&mut self, text: &str) {
        // A closed stdout leaves nobody to report to.
        let _ = writeln!(self.output, "{}", text.green());
    }
}
