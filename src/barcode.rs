//! Multi-scale barcode decoding
//!
//! QR detectors are unreliable on high-resolution photographs; a shrunk copy
//! often decodes when the full frame does not. Decoding therefore walks a
//! deterministic ladder of resize ratios from full resolution down, stopping
//! at the first rung that yields exactly one code.

use image::{imageops::FilterType, DynamicImage, GrayImage};
use tracing::{debug, warn};

/// Decoding capability over one grayscale frame. Returns every code found,
/// in detection order; duplicates of the same code may appear.
pub trait BarcodeScanner {
    fn scan(&self, image: &GrayImage) -> Vec<String>;
}

/// QR backend over the pure-Rust `rqrr` detector. Grids that detect but fail
/// to decode contribute nothing.
pub struct RqrrScanner;

impl BarcodeScanner for RqrrScanner {
    fn scan(&self, image: &GrayImage) -> Vec<String> {
        let mut prepared = rqrr::PreparedImage::prepare(image.clone());
        prepared
            .detect_grids()
            .iter()
            .filter_map(|grid| grid.decode().ok().map(|(_, content)| content))
            .collect()
    }
}

const SCALE_STEP: f64 = 0.03;
const SCALE_FLOOR: f64 = 0.01;

/// Resize ratios: `sqrt(s)` for `s` stepping from 1.0 down to the floor,
/// full resolution first, tapering geometrically.
fn scale_ladder() -> impl Iterator<Item = f64> {
    let steps = ((1.0 - SCALE_FLOOR) / SCALE_STEP).ceil() as usize;
    (0..steps)
        .map(|i| 1.0 - i as f64 * SCALE_STEP)
        .take_while(|s| *s > SCALE_FLOOR)
        .map(f64::sqrt)
}

/// Decode exactly one barcode from `img`, retrying at progressively smaller
/// resolutions.
///
/// Returns `None` when the ladder is exhausted without a decode, or
/// immediately when any rung finds more than one distinct code: ambiguity is
/// never resolved by guessing, and smaller rungs are not tried.
pub fn decode_barcode(img: &DynamicImage, scanner: &dyn BarcodeScanner) -> Option<String> {
    let (width, height) = (img.width(), img.height());
    for scalar in scale_ladder() {
        let w = (width as f64 * scalar) as u32;
        let h = (height as f64 * scalar) as u32;
        if w == 0 || h == 0 {
            break;
        }
        debug!(scalar, w, h, "scanning");
        let scaled = img.resize_exact(w, h, FilterType::Triangle).to_luma8();
        let mut codes = scanner.scan(&scaled);
        codes.sort();
        codes.dedup();
        match codes.len() {
            0 => continue,
            1 => {
                debug!(code = %codes[0], "decoded");
                return codes.pop();
            }
            n => {
                warn!(codes = n, "image with more than one barcode");
                return None;
            }
        }
    }
    None
}
