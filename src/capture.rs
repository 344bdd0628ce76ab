//! External camera-control subprocess boundary
//!
//! The session obtains raw image bytes by spawning an external
//! camera-control process and collecting its standard output. This is the
//! only place the state machine blocks on an external process, and the only
//! recovery path is the operator: a stuck process can be killed, a failed
//! one retried or abandoned.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Result, SorterError};
use crate::prompt::Prompt;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One camera shot. `Ok(None)` means the operator abandoned the capture.
pub trait CaptureTool {
    fn capture(&mut self, prompt: &mut dyn Prompt) -> Result<Option<Vec<u8>>>;
}

/// Captures by running an external command and collecting its stdout as the
/// raw image bytes. Defaults to gphoto2's capture-and-download mode.
pub struct SubprocessCapture {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessCapture {
    pub const DEFAULT_COMMAND: &'static str = "gphoto2 --capture-image-and-download --stdout";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    pub fn new(command: &str, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SorterError::Capture("empty capture command".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub fn gphoto2() -> Self {
        Self {
            program: "gphoto2".to_string(),
            args: vec![
                "--capture-image-and-download".to_string(),
                "--stdout".to_string(),
            ],
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// One spawn of the capture process. `Ok(None)` covers both a non-zero
    /// exit and an operator-killed hang; the caller decides whether to
    /// retry.
    fn attempt(&self, prompt: &mut dyn Prompt) -> Result<Option<Vec<u8>>> {
        debug!("spawning {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SorterError::Capture(format!("failed to spawn {}: {}", self.program, e)))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SorterError::Capture("capture process has no stdout".to_string()))?;
        // Drain stdout off-thread so a large image can't deadlock the pipe
        // while we poll for exit.
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });

        let status: Option<ExitStatus> = 'wait: loop {
            let deadline = Instant::now() + self.timeout;
            while Instant::now() < deadline {
                if let Some(status) = child
                    .try_wait()
                    .map_err(|e| SorterError::Capture(e.to_string()))?
                {
                    break 'wait Some(status);
                }
                thread::sleep(POLL_INTERVAL);
            }
            if prompt.ask_yes_no("Image capture is taking ages. Kill capture?", true)? {
                let _ = child.kill();
                let _ = child.wait();
                break 'wait None;
            }
        };

        let bytes = reader
            .join()
            .map_err(|_| SorterError::Capture("stdout reader panicked".to_string()))?;

        match status {
            Some(s) if s.success() => Ok(Some(bytes)),
            Some(s) => {
                warn!("capture process exited with {s}");
                Ok(None)
            }
            None => {
                warn!("capture process killed by operator");
                Ok(None)
            }
        }
    }
}

impl CaptureTool for SubprocessCapture {
    fn capture(&mut self, prompt: &mut dyn Prompt) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(bytes) = self.attempt(prompt)? {
                return Ok(Some(bytes));
            }
            if !prompt.ask_yes_no("Image capture failed. Retry?", true)? {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PromptError, ScriptedPrompt};

    #[test]
    fn collects_stdout_of_a_successful_command() {
        let mut tool =
            SubprocessCapture::new("printf captured-bytes", Duration::from_secs(5)).unwrap();
        let mut prompt = ScriptedPrompt::new(&[]);
        let bytes = tool.capture(&mut prompt).unwrap().unwrap();
        assert_eq!(bytes, b"captured-bytes");
    }

    #[test]
    fn nonzero_exit_offers_retry_then_abandon() {
        let mut tool = SubprocessCapture::new("false", Duration::from_secs(5)).unwrap();
        // Decline the retry
        let mut prompt = ScriptedPrompt::new(&["n"]);
        assert!(tool.capture(&mut prompt).unwrap().is_none());
        assert_eq!(prompt.transcript()[0].0, "Image capture failed. Retry?");
    }

    #[test]
    fn retry_runs_the_command_again_before_abandoning() {
        let mut tool = SubprocessCapture::new("false", Duration::from_secs(5)).unwrap();
        // Retry once, then give up
        let mut prompt = ScriptedPrompt::new(&["y", "n"]);
        assert!(tool.capture(&mut prompt).unwrap().is_none());
        let retries = prompt
            .transcript()
            .iter()
            .filter(|(q, _)| q == "Image capture failed. Retry?")
            .count();
        assert_eq!(retries, 2);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(SubprocessCapture::new("   ", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn interrupt_during_failure_prompt_propagates() {
        let mut tool = SubprocessCapture::new("false", Duration::from_secs(5)).unwrap();
        let mut prompt = ScriptedPrompt::interrupting();
        match tool.capture(&mut prompt) {
            Err(SorterError::Prompt(PromptError::Interrupted)) => {}
            other => panic!("expected interrupt, got {other:?}"),
        }
    }
}
