//! Concurrent batch pipeline
//!
//! Applies decode -> route -> extract to each input image and joins the
//! results into one append-only metadata table. Images are independent, so
//! the per-image work fans out over a rayon pool; rows funnel through a
//! channel to a single writer thread that owns the table handle, so appends
//! never interleave. Row order is completion order, not input order.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use rayon::prelude::*;
use tracing::{error, info};

use crate::barcode::{decode_barcode, BarcodeScanner};
use crate::error::{Result, SorterError};
use crate::metadata::extract_summary;
use crate::router::route;
use crate::table::{MetadataRow, MetadataTable, METADATA_TABLE_NAME};

/// Bucket for images whose barcode could not be read, and for files that
/// could not be opened as images at all.
pub const UNKNOWN_BUCKET: &str = "unknown";

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    /// Rows appended to the metadata table.
    pub rows: usize,
    /// Inputs that could not be opened as images (filed, but no row).
    pub unreadable: usize,
}

/// One image end to end: open, decode, file, extract. Returns `None` only
/// when the file could not be read as an image; it is still filed under the
/// unknown bucket, but no metadata row is emitted.
fn process_image(
    source: &Path,
    output_root: &Path,
    scanner: &dyn BarcodeScanner,
) -> Option<MetadataRow> {
    let img = match image::open(source) {
        Ok(img) => img,
        Err(e) => {
            error!("couldn't read image '{}': {}", source.display(), e);
            if let Err(e) = route(source, &output_root.join(UNKNOWN_BUCKET)) {
                error!("couldn't file '{}': {}", source.display(), e);
            }
            return None;
        }
    };

    let code = decode_barcode(&img, scanner).unwrap_or_else(|| UNKNOWN_BUCKET.to_string());
    if let Err(e) = route(source, &output_root.join(&code)) {
        error!("couldn't file '{}': {}", source.display(), e);
    }

    Some(MetadataRow {
        source: source.to_path_buf(),
        code,
        exif: extract_summary(source),
    })
}

/// Run the full pipeline over `inputs` with a pool of `threads` workers.
///
/// Per-image failures are isolated: an unreadable or undecodable image never
/// aborts the batch. The metadata table under `output_root` is created with
/// its header on first use and strictly appended to afterwards, so repeated
/// runs against the same directory accumulate rows.
pub fn run_batch(
    inputs: &[PathBuf],
    output_root: &Path,
    threads: usize,
    scanner: &(dyn BarcodeScanner + Sync),
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_root)?;
    let mut table = MetadataTable::open(&output_root.join(METADATA_TABLE_NAME))?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| SorterError::Pool(e.to_string()))?;

    let total = inputs.len();
    let (tx, rx) = mpsc::channel::<MetadataRow>();

    let rows = thread::scope(|s| -> Result<usize> {
        // Single append point: the writer owns the table handle and drains
        // the channel until every worker has dropped its sender.
        let writer = s.spawn(move || -> Result<usize> {
            let mut rows = 0;
            for row in rx {
                table.append(&row)?;
                rows += 1;
                info!("[{rows}/{total}] {} -> {}", row.source.display(), row.code);
            }
            Ok(rows)
        });

        pool.install(|| {
            inputs.par_iter().for_each_with(tx, |tx, source| {
                if let Some(row) = process_image(source, output_root, scanner) {
                    // A send fails only once the writer has stopped on an
                    // append error; join surfaces that error.
                    let _ = tx.send(row);
                }
            });
        });

        writer
            .join()
            .map_err(|_| SorterError::Pool("writer thread panicked".to_string()))?
    })?;

    Ok(BatchSummary {
        rows,
        unreadable: total - rows,
    })
}
