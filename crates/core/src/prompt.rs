//! Interactive input as an injected capability.

use crate::error::{OfferError, Result, ValidationError};
use std::io::{BufRead, Write};

/// Source of answers for the offer manager.
pub trait Prompter {
    /// Shows `question` and returns the raw answer line (without newline).
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Shows an informational line (validation errors, confirmations).
    fn notify(&mut self, message: &str);
}

/// Line-oriented prompter over any reader/writer pair; stdin/stdout in the
/// binary.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.output.write_all(question.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(OfferError::InputClosed(question.trim().to_string()));
        }
        let answer = line.trim_end_matches(['\n', '\r']).to_string();
        Ok(answer)
    }

    fn notify(&mut self, message: &str) {
        if let Err(err) = writeln!(self.output, "{message}") {
            log::warn!("Failed to write prompt message: {err}");
        }
    }
}

/// Asks until `parse` accepts the trimmed answer, reporting each rejection.
pub fn ask_until<P, T, F>(prompter: &mut P, question: &str, mut parse: F) -> Result<T>
where
    P: Prompter + ?Sized,
    F: FnMut(&str) -> std::result::Result<T, ValidationError>,
{
    loop {
        let answer = prompter.ask(question)?;
        match parse(answer.trim()) {
            Ok(value) => return Ok(value),
            Err(err) => prompter.notify(&err.to_string()),
        }
    }
}

/// Like [`ask_until`], but a blank answer yields `None` without parsing.
pub fn ask_optional<P, T, F>(prompter: &mut P, question: &str, mut parse: F) -> Result<Option<T>>
where
    P: Prompter + ?Sized,
    F: FnMut(&str) -> std::result::Result<T, ValidationError>,
{
    ask_until(prompter, question, |answer| {
        if answer.is_empty() {
            Ok(None)
        } else {
            parse(answer).map(Some)
        }
    })
}

pub fn ask_required<P: Prompter + ?Sized>(prompter: &mut P, question: &str) -> Result<String> {
    ask_until(prompter, question, |answer| {
        if answer.is_empty() {
            Err(ValidationError::Required)
        } else {
            Ok(answer.to_string())
        }
    })
}

pub fn ask_yes_no<P: Prompter + ?Sized>(prompter: &mut P, question: &str) -> Result<bool> {
    ask_until(prompter, question, |answer| {
        match answer.to_lowercase().as_str() {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err(ValidationError::NotYesNo(answer.to_string())),
        }
    })
}
