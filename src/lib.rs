//! specimen_sorter - files barcoded specimen photographs
//!
//! Two operating modes share one decoding core:
//! - batch (`barcode-sort`): decode sample barcodes from many photographs,
//!   file each image under its decoded identifier, and append one row per
//!   image to a metadata table
//! - interactive (`tissue-sampler`): drive a camera, confirm identifiers and
//!   plate/well coordinates with an operator, and persist everything so a
//!   restarted session never re-uses an identifier or coordinate

pub mod barcode;
pub mod capture;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod prompt;
pub mod router;
pub mod session;
pub mod table;
pub mod viewer;
pub mod wells;

pub use error::{Result, SorterError};
