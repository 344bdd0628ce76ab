//! Append-only tabular outputs
//!
//! Two flat tables, one per operating mode: the batch metadata TSV and the
//! interactive sample CSV. Both get a header exactly once, on creation, and
//! only ever gain rows afterwards; rows are never rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SorterError};
use crate::metadata::ExifSummary;

pub const METADATA_TABLE_NAME: &str = "image_metadata.tsv";
pub const SAMPLE_TABLE_NAME: &str = "samples.csv";

const METADATA_HEADER: &str =
    "image_path\timage_code\texif_datetime\texif_latitude\texif_longitude\texif_elevation";
const SAMPLE_HEADER: &str = "sample_id,plate,well,has_seed";

/// One row of the batch metadata table. Missing timestamp or GPS fields
/// render as the `NA` sentinel.
#[derive(Debug, Clone)]
pub struct MetadataRow {
    pub source: PathBuf,
    pub code: String,
    pub exif: ExifSummary,
}

impl MetadataRow {
    fn to_tsv(&self) -> String {
        let datetime = self.exif.datetime.as_deref().unwrap_or("NA");
        let (lat, lon, elev) = match self.exif.gps {
            Some(g) => (
                g.latitude.to_string(),
                g.longitude.to_string(),
                g.elevation.to_string(),
            ),
            None => ("NA".into(), "NA".into(), "NA".into()),
        };
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.source.display(),
            self.code,
            datetime,
            lat,
            lon,
            elev
        )
    }
}

/// Tab-separated batch metadata table. Holds the file handle for the
/// lifetime of a run; the pipeline funnels every append through one of
/// these on a single writer thread.
pub struct MetadataTable {
    file: File,
}

impl MetadataTable {
    pub fn open(path: &Path) -> Result<Self> {
        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if fresh {
            writeln!(file, "{METADATA_HEADER}")?;
        }
        Ok(Self { file })
    }

    pub fn append(&mut self, row: &MetadataRow) -> Result<()> {
        writeln!(self.file, "{}", row.to_tsv())?;
        self.file.flush()?;
        Ok(())
    }
}

/// One committed sample of the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub sample_id: String,
    pub plate: String,
    pub well: String,
    pub has_seed: bool,
}

impl SampleRecord {
    fn to_csv(&self) -> String {
        let seed = if self.has_seed { "Yes" } else { "No" };
        format!("{},{},{},{}", self.sample_id, self.plate, self.well, seed)
    }

    fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 4 {
            return Err(SorterError::TableFormat(line.to_string()));
        }
        Ok(Self {
            sample_id: fields[0].to_string(),
            plate: fields[1].to_string(),
            well: fields[2].to_string(),
            has_seed: fields[3] == "Yes",
        })
    }
}

/// Durable sample table. Read back in full on startup so a restarted
/// session never re-uses an identifier or a plate/well pair; appended to on
/// each commit, one open-write-close per row.
pub struct SampleTable {
    path: PathBuf,
}

impl SampleTable {
    /// Open the table, creating it with a header if absent. An existing
    /// table is left untouched so sessions resume rather than restart.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut file = File::create(path)?;
            writeln!(file, "{SAMPLE_HEADER}")?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn read_all(&self) -> Result<Vec<SampleRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(SampleRecord::parse(&line)?);
        }
        Ok(records)
    }

    pub fn append(&self, record: &SampleRecord) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", record.to_csv())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GpsPoint;
    use std::fs;

    #[test]
    fn metadata_header_is_written_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_TABLE_NAME);

        {
            let mut table = MetadataTable::open(&path).unwrap();
            table
                .append(&MetadataRow {
                    source: PathBuf::from("a.jpg"),
                    code: "X1".into(),
                    exif: ExifSummary::default(),
                })
                .unwrap();
        }
        {
            let mut table = MetadataTable::open(&path).unwrap();
            table
                .append(&MetadataRow {
                    source: PathBuf::from("b.jpg"),
                    code: "unknown".into(),
                    exif: ExifSummary {
                        datetime: Some("2019:02:11 10:11:12".into()),
                        gps: Some(GpsPoint {
                            latitude: -51.5,
                            longitude: -0.125,
                            elevation: 63.58,
                        }),
                    },
                })
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], METADATA_HEADER);
        assert_eq!(lines[1], "a.jpg\tX1\tNA\tNA\tNA\tNA");
        assert_eq!(lines[2], "b.jpg\tunknown\t2019:02:11 10:11:12\t-51.5\t-0.125\t63.58");
    }

    #[test]
    fn sample_table_roundtrips_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SAMPLE_TABLE_NAME);
        let table = SampleTable::open(&path).unwrap();

        let a = SampleRecord {
            sample_id: "S001".into(),
            plate: "P1".into(),
            well: "A01".into(),
            has_seed: true,
        };
        let b = SampleRecord {
            sample_id: "S002".into(),
            plate: "P1".into(),
            well: "A02".into(),
            has_seed: false,
        };
        table.append(&a).unwrap();
        table.append(&b).unwrap();

        assert_eq!(table.read_all().unwrap(), vec![a, b]);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "sample_id,plate,well,has_seed\nS001,P1,A01,Yes\nS002,P1,A02,No\n");
    }

    #[test]
    fn reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SAMPLE_TABLE_NAME);

        let table = SampleTable::open(&path).unwrap();
        table
            .append(&SampleRecord {
                sample_id: "S001".into(),
                plate: "P1".into(),
                well: "A01".into(),
                has_seed: true,
            })
            .unwrap();
        drop(table);

        let table = SampleTable::open(&path).unwrap();
        assert_eq!(table.read_all().unwrap().len(), 1);
    }

    #[test]
    fn malformed_sample_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SAMPLE_TABLE_NAME);
        fs::write(&path, "sample_id,plate,well,has_seed\nonly,three,fields\n").unwrap();

        let table = SampleTable::open(&path).unwrap();
        assert!(table.read_all().is_err());
    }
}
