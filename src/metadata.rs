//! EXIF timestamp and GPS extraction
//!
//! Pulls the capture timestamp and GPS fix out of an image's EXIF block via
//! kamadak-exif. The timestamp is required (missing means "NA" downstream);
//! GPS is independently best-effort.
//!
//! Coordinate conversion is degrees + minutes/60 only. The seconds slot of
//! the rational triple is intentionally not added, matching the established
//! metadata table format; this loses up to ~30 arc-seconds of precision.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Exif, In, Rational, Tag, Value};
use tracing::debug;

/// Decimal-degree coordinates plus elevation in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// Capture timestamp and GPS fix from one image's EXIF block. Either field
/// may be absent without the other being affected.
#[derive(Debug, Clone, Default)]
pub struct ExifSummary {
    pub datetime: Option<String>,
    pub gps: Option<GpsPoint>,
}

/// Convert a rational (degrees, minutes, seconds) triple to decimal degrees.
/// Only degrees and minutes contribute; the seconds slot is dropped.
pub fn degrees_minutes_to_decimal(dms: &[Rational]) -> Option<f64> {
    if dms.len() < 2 {
        return None;
    }
    Some(dms[0].to_f64() + dms[1].to_f64() / 60.0)
}

/// `S` and `W` hemisphere letters flip the sign. A missing reference means
/// the default northern/eastern hemisphere.
pub fn apply_hemisphere(value: f64, reference: Option<&str>) -> f64 {
    match reference {
        Some("S") | Some("W") => -value,
        _ => value,
    }
}

/// Read the EXIF summary for `path`. Never fails: an unreadable or absent
/// EXIF block simply yields an empty summary.
pub fn extract_summary(path: &Path) -> ExifSummary {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("couldn't open '{}' for EXIF: {}", path.display(), e);
            return ExifSummary::default();
        }
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("no EXIF in '{}': {}", path.display(), e);
            return ExifSummary::default();
        }
    };

    ExifSummary {
        datetime: ascii_field(&exif, Tag::DateTimeOriginal),
        gps: extract_gps(&exif),
    }
}

fn extract_gps(exif: &Exif) -> Option<GpsPoint> {
    let lat_dms = rational_field(exif, Tag::GPSLatitude)?;
    let lon_dms = rational_field(exif, Tag::GPSLongitude)?;
    let alt = rational_field(exif, Tag::GPSAltitude)?;

    let latitude = apply_hemisphere(
        degrees_minutes_to_decimal(&lat_dms)?,
        ascii_field(exif, Tag::GPSLatitudeRef).as_deref(),
    );
    let longitude = apply_hemisphere(
        degrees_minutes_to_decimal(&lon_dms)?,
        ascii_field(exif, Tag::GPSLongitudeRef).as_deref(),
    );
    let elevation = alt.first()?.to_f64();

    Some(GpsPoint {
        latitude,
        longitude,
        elevation,
    })
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match &f.value {
        Value::Ascii(v) if !v.is_empty() => Some(String::from_utf8_lossy(&v[0]).into_owned()),
        _ => None,
    })
}

fn rational_field(exif: &Exif, tag: Tag) -> Option<Vec<Rational>> {
    exif.get_field(tag, In::PRIMARY).and_then(|f| match &f.value {
        Value::Rational(v) if !v.is_empty() => Some(v.clone()),
        _ => None,
    })
}
