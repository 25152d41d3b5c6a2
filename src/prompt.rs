use std::io::{self, BufRead, Write};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Standard input closed before an answer was given.
    #[error("input is no longer available")]
    InputUnavailable,
    #[error("console I/O failed")]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Console – line-oriented question/answer over any reader and writer
// ---------------------------------------------------------------------------

/// Prompt/response channel. Production wraps stdin/stdout; tests use
/// in-memory buffers.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    /// Writer for report output between prompts.
    pub fn out(&mut self) -> &mut W {
        &mut self.output
    }

    /// Write `message` and read one answer, trimmed and lower-cased.
    ///
    /// Bytes that are not UTF-8 become U+FFFD, so such a line never matches
    /// an accepted answer and is re-prompted like any other typo.
    pub fn ask(&mut self, message: &str) -> Result<String, PromptError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Err(PromptError::InputUnavailable);
        }
        Ok(String::from_utf8_lossy(&line).trim().to_lowercase())
    }

    /// Ask until the answer is one of `allowed`, then confirm it.
    pub fn prompt_choice(&mut self, message: &str, allowed: &[&str]) -> Result<String, PromptError> {
        loop {
            let answer = self.ask(message)?;
            if allowed.contains(&answer.as_str()) {
                writeln!(self.output, "Great! You've chosen: {answer}\n")?;
                return Ok(answer);
            }
            debug!("rejected answer {answer:?}");
            writeln!(self.output, "It looks like your entry is incorrect.")?;
            writeln!(self.output, "Let's try again!")?;
        }
    }

    /// Yes/no question; only `yes` counts as yes.
    pub fn confirm(&mut self, message: &str) -> Result<bool, PromptError> {
        Ok(self.ask(message)? == "yes")
    }
}
