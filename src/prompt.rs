//! Operator prompt capability
//!
//! The session state machine never touches the console directly; it asks
//! questions through this trait so tests can drive it with scripted answers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("operator interrupt")]
    Interrupted,

    #[error("prompt input closed")]
    Eof,

    #[error("prompt IO failed: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, PromptError>;

/// Blocking question/answer boundary between the session and the operator.
pub trait Prompt {
    /// Yes/no question; an empty answer takes `default`.
    fn ask_yes_no(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Free-form question; an empty answer takes `default`.
    fn ask_value(&mut self, question: &str, default: &str) -> Result<String>;
}

/// Console prompt with line editing. Ctrl-C surfaces as
/// [`PromptError::Interrupted`] so the session can unwind cleanly.
pub struct ConsolePrompt {
    editor: rustyline::DefaultEditor,
}

impl ConsolePrompt {
    pub fn new() -> Result<Self> {
        let editor = rustyline::DefaultEditor::new().map_err(|e| PromptError::Io(e.to_string()))?;
        Ok(Self { editor })
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        use rustyline::error::ReadlineError;

        match self.editor.readline(prompt) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(ReadlineError::Interrupted) => Err(PromptError::Interrupted),
            Err(ReadlineError::Eof) => Err(PromptError::Eof),
            Err(e) => Err(PromptError::Io(e.to_string())),
        }
    }
}

impl Prompt for ConsolePrompt {
    fn ask_yes_no(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let resp = self.read_line(&format!("{question} {hint} "))?;
        Ok(match resp.chars().next() {
            None => default,
            Some(c) => c.eq_ignore_ascii_case(&'y'),
        })
    }

    fn ask_value(&mut self, question: &str, default: &str) -> Result<String> {
        let resp = self.read_line(&format!("{question} [{default}] "))?;
        if resp.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(resp)
        }
    }
}

/// Scripted prompt for tests. Answers are consumed in order; the literal
/// `"^C"` simulates an operator interrupt, an empty string accepts the
/// default, and an exhausted script reads as EOF. Every question asked is
/// recorded together with the default that was offered.
#[cfg(test)]
pub struct ScriptedPrompt {
    answers: std::collections::VecDeque<String>,
    transcript: Vec<(String, String)>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn interrupting() -> Self {
        Self::new(&["^C"])
    }

    pub fn transcript(&self) -> &[(String, String)] {
        &self.transcript
    }

    fn next_answer(&mut self, question: &str, default: &str) -> Result<String> {
        self.transcript.push((question.to_string(), default.to_string()));
        match self.answers.pop_front() {
            None => Err(PromptError::Eof),
            Some(a) if a == "^C" => Err(PromptError::Interrupted),
            Some(a) => Ok(a),
        }
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask_yes_no(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = self.next_answer(question, if default { "y" } else { "n" })?;
        Ok(match answer.chars().next() {
            None => default,
            Some(c) => c.eq_ignore_ascii_case(&'y'),
        })
    }

    fn ask_value(&mut self, question: &str, default: &str) -> Result<String> {
        let answer = self.next_answer(question, default)?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}
