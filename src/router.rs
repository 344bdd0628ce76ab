//! Identifier-keyed filing of source images
//!
//! Copies each image into a bucket directory named after its decoded
//! identifier. Nothing is ever overwritten: a name collision gets a literal
//! `_2` inserted before the extension, again and again until a free name is
//! found. The destination name stops matching the source name after the
//! first collision; uniqueness is the only guarantee.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Copy `source` into `dest_dir` (created along with parents if absent) and
/// return the path actually written. The source file is never modified.
pub fn route(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "unnamed".into());
    let mut dest = dest_dir.join(name);
    while dest.exists() {
        warn!("'{}' exists, appending '_2' to name", dest.display());
        dest = with_suffix(&dest, "_2");
    }
    fs::copy(source, &dest)?;
    copy_mtime(source, &dest)?;
    debug!("cp {} {}", source.display(), dest.display());
    Ok(dest)
}

/// Insert `suffix` between the file stem and the extension. Dotfiles count
/// as extensionless.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = match file.rfind('.') {
        Some(i) if i > 0 => file.split_at(i),
        _ => (file.as_str(), ""),
    };
    path.with_file_name(format!("{stem}{suffix}{ext}"))
}

// The copy keeps the source's modification time, so capture-time ordering
// survives filing.
fn copy_mtime(source: &Path, dest: &Path) -> std::io::Result<()> {
    let mtime = fs::metadata(source)?.modified()?;
    fs::File::options().write(true).open(dest)?.set_modified(mtime)
}
