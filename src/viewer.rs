//! Image preview capability
//!
//! After each shot the operator may ask to see the frame before deciding to
//! keep going. Display is delegated to an external viewer command so the
//! session never links a GUI stack; preview is best-effort and a viewer that
//! exits non-zero never fails the sample.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{Result, SorterError};

/// Displays one captured frame to the operator.
pub trait ImageViewer {
    fn show(&mut self, jpeg: &[u8]) -> Result<()>;
}

/// Shows a frame by writing it to a scratch file and handing the path to an
/// external viewer command. The scratch file is reused per instance and
/// removed once the viewer exits.
pub struct SubprocessViewer {
    program: String,
    args: Vec<String>,
    scratch: PathBuf,
}

impl SubprocessViewer {
    pub const DEFAULT_COMMAND: &'static str = "xdg-open";

    pub fn new(command: &str) -> Result<Self> {
        static SEQ: AtomicU64 = AtomicU64::new(0);

        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SorterError::Capture("empty viewer command".to_string()))?;
        let scratch = env::temp_dir().join(format!(
            "specimen-preview-{}-{}.jpg",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        Ok(Self {
            program,
            args: parts.collect(),
            scratch,
        })
    }
}

impl ImageViewer for SubprocessViewer {
    fn show(&mut self, jpeg: &[u8]) -> Result<()> {
        fs::write(&self.scratch, jpeg)?;
        debug!("showing {} via {}", self.scratch.display(), self.program);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.scratch)
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => warn!("viewer exited with {s}"),
            Err(e) => warn!("couldn't launch viewer {}: {}", self.program, e),
        }
        let _ = fs::remove_file(&self.scratch);
        Ok(())
    }
}

/// Viewer that discards every frame, for sessions with no display attached.
pub struct NullViewer;

impl ImageViewer for NullViewer {
    fn show(&mut self, _jpeg: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_the_frame_and_cleans_up_after_the_viewer() {
        let mut viewer = SubprocessViewer::new("true").unwrap();
        viewer.show(b"jpeg-bytes").unwrap();
        assert!(!viewer.scratch.exists());
    }

    #[test]
    fn failing_viewer_does_not_fail_the_preview() {
        let mut viewer = SubprocessViewer::new("false").unwrap();
        assert!(viewer.show(b"jpeg-bytes").is_ok());
    }

    #[test]
    fn missing_viewer_program_does_not_fail_the_preview() {
        let mut viewer = SubprocessViewer::new("no-such-viewer-binary").unwrap();
        assert!(viewer.show(b"jpeg-bytes").is_ok());
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(SubprocessViewer::new("   ").is_err());
    }
}
