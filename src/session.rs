//! Interactive capture session state machine
//!
//! Drives one long-running, resumable session:
//! Idle -> Capturing -> IdentifyingSample -> AllocatingPlateWell -> SeedFlag
//! -> Commit, then back to Idle. All durable state lives in the sample table
//! and the per-sample image directories; the in-memory sets are rebuilt from
//! the table on startup, so a restarted session never re-uses a sample
//! identifier or a plate/well pair.
//!
//! An operator interrupt anywhere before commit discards the in-memory
//! sample. Nothing is written until commit, so an interrupt can never leave
//! a half-written directory or table row behind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::barcode::{decode_barcode, BarcodeScanner};
use crate::capture::CaptureTool;
use crate::error::{Result, SorterError};
use crate::prompt::{Prompt, PromptError};
use crate::table::{SampleRecord, SampleTable, SAMPLE_TABLE_NAME};
use crate::viewer::ImageViewer;
use crate::wells::{next_well, well_index, well_label};

pub struct Capturer<C, P, S, V> {
    outdir: PathBuf,
    table: SampleTable,
    capture: C,
    prompt: P,
    scanner: S,
    viewer: V,
    used_ids: HashSet<String>,
    used_wells: HashSet<(String, String)>,
    plate: String,
    last_well: Option<usize>,
}

impl<C: CaptureTool, P: Prompt, S: BarcodeScanner, V: ImageViewer> Capturer<C, P, S, V> {
    /// Open (or create) the session directory and rebuild the used-id set,
    /// used plate/well set, working plate, and well cursor from every row of
    /// the persisted sample table.
    pub fn resume(outdir: &Path, capture: C, prompt: P, scanner: S, viewer: V) -> Result<Self> {
        fs::create_dir_all(outdir)?;
        let table = SampleTable::open(&outdir.join(SAMPLE_TABLE_NAME))?;

        let mut used_ids = HashSet::new();
        let mut used_wells = HashSet::new();
        let mut plate = String::new();
        let mut last_well = None;
        for record in table.read_all()? {
            if let Some(idx) = well_index(&record.well) {
                last_well = Some(idx);
            }
            used_wells.insert((record.plate.clone(), record.well));
            plate = record.plate;
            used_ids.insert(record.sample_id);
        }
        if !used_ids.is_empty() {
            info!(
                samples = used_ids.len(),
                "resumed session from existing sample table"
            );
        }

        Ok(Self {
            outdir: outdir.to_path_buf(),
            table,
            capture,
            prompt,
            scanner,
            viewer,
            used_ids,
            used_wells,
            plate,
            last_well,
        })
    }

    /// Idle loop: empty input starts a sample, `exit` (or Ctrl-C / EOF at
    /// the idle prompt) ends the session. A committed or discarded sample
    /// always returns here.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let cmd = match self
                .prompt
                .ask_value("\nPress enter to start sample capture, or 'exit' to finish", "")
            {
                Ok(cmd) => cmd,
                Err(PromptError::Interrupted) | Err(PromptError::Eof) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            if cmd.eq_ignore_ascii_case("exit") {
                return Ok(());
            }
            if !cmd.is_empty() {
                continue;
            }
            match self.capture_sample() {
                Ok(Some(id)) => info!("committed sample '{id}'"),
                Ok(None) => info!("capture abandoned"),
                Err(SorterError::Prompt(PromptError::Interrupted)) => {
                    warn!("interrupted, sample discarded");
                }
                Err(SorterError::Prompt(PromptError::Eof)) => {
                    warn!("input closed, sample discarded");
                    return Ok(());
                }
                Err(SorterError::SampleDirExists(dir)) => {
                    error!(
                        "sample directory '{}' already exists, commit aborted",
                        dir.display()
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One full pass through the sample states. Returns the committed sample
    /// id, or `None` if the operator abandoned capture before the first
    /// shot. Errors out of any state discard the in-memory sample.
    fn capture_sample(&mut self) -> Result<Option<String>> {
        // Capturing: at least one shot before anything else may happen. Each
        // shot may be previewed before deciding whether to take more.
        let mut shots: Vec<Vec<u8>> = Vec::new();
        loop {
            if let Some(bytes) = self.capture.capture(&mut self.prompt)? {
                if self.prompt.ask_yes_no("Show image?", true)? {
                    self.viewer.show(&bytes)?;
                }
                shots.push(bytes);
            } else if shots.is_empty() {
                return Ok(None);
            }
            if !shots.is_empty() && self.prompt.ask_yes_no("Capture another image?", true)? {
                continue;
            }
            break;
        }

        // IdentifyingSample: the first shot's barcode proposes the default.
        let proposed = image::load_from_memory(&shots[0])
            .ok()
            .and_then(|img| decode_barcode(&img, &self.scanner))
            .unwrap_or_default();
        let sample_id = loop {
            let answer = self.prompt.ask_value("Sample name is", &proposed)?;
            if answer.is_empty() {
                warn!("sample id must not be empty");
            } else if answer.contains(['/', '\\']) {
                warn!("sample id must not contain path separators");
            } else if self.used_ids.contains(&answer) {
                warn!("duplicate sample id '{answer}'");
            } else {
                break answer;
            }
        };

        // AllocatingPlateWell: propose the next well on the working plate;
        // a pair that was ever assigned is rejected, never merged.
        let (plate, well_idx) = loop {
            let plate = self.prompt.ask_value("Which plate?", &self.plate)?;
            if plate.is_empty() {
                warn!("plate must not be empty");
                continue;
            }
            let proposal = well_label(next_well(self.last_well));
            let answer = self.prompt.ask_value("Which well?", &proposal)?;
            let Some(idx) = well_index(&answer) else {
                warn!("invalid well '{answer}' (must be like A01)");
                continue;
            };
            let label = well_label(idx);
            if self.used_wells.contains(&(plate.clone(), label)) {
                warn!("plate {plate} well {} already used", well_label(idx));
                continue;
            }
            break (plate, idx);
        };

        // SeedFlag: recorded verbatim.
        let has_seed = self.prompt.ask_yes_no("Does this sample have seed?", true)?;

        let record = SampleRecord {
            sample_id: sample_id.clone(),
            plate: plate.clone(),
            well: well_label(well_idx),
            has_seed,
        };
        self.commit(&record, &shots)?;

        // Only a committed sample advances the session state.
        self.used_ids.insert(sample_id.clone());
        self.used_wells.insert((plate.clone(), record.well));
        self.plate = plate;
        self.last_well = Some(well_idx);
        Ok(Some(sample_id))
    }

    /// Write the image directory, then append the table row. A directory
    /// that already exists fails the commit outright; an existing sample is
    /// never merged into.
    fn commit(&self, record: &SampleRecord, shots: &[Vec<u8>]) -> Result<()> {
        let dir = self.outdir.join(&record.sample_id);
        if dir.exists() {
            return Err(SorterError::SampleDirExists(dir));
        }
        fs::create_dir(&dir)?;
        for (i, jpg) in shots.iter().enumerate() {
            fs::write(dir.join(format!("{i:02}.jpg")), jpg)?;
        }
        self.table.append(record)?;
        info!(
            "wrote {} images for '{}' ({} {})",
            shots.len(),
            record.sample_id,
            record.plate,
            record.well
        );
        Ok(())
    }
}
