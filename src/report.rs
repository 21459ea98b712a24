//! CSV export of the time series.
//!
//! A [`SeriesReport`] can be fed point by point (e.g. from a snapshot subscriber, so the file
//! grows while the run progresses) or written in one go with [`write_series`].

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::Path;

use csv::Writer;
use log::debug;

use crate::error::{Result, SeirError};
use crate::stats::TimeSeriesPoint;

pub struct SeriesReport {
    writer: Writer<File>,
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful.
fn generate_validate_filepath(path: &Path) -> Result<File> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SeirError::ReportError(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

impl SeriesReport {
    /// # Errors
    ///
    /// Returns an error if the path isn't a `.csv` file or can't be created.
    pub fn create(path: &Path) -> Result<Self> {
        debug!("creating series report at {}", path.display());
        let file = generate_validate_filepath(path)?;
        Ok(SeriesReport {
            writer: Writer::from_writer(file),
        })
    }

    /// Writes one row and flushes it.
    ///
    /// # Errors
    ///
    /// Propagates serialization and I/O failures.
    pub fn send(&mut self, point: &TimeSeriesPoint) -> Result<()> {
        self.writer.serialize(point)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes `series` to `path` as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the file can't be created or written.
pub fn write_series(path: &Path, series: &[TimeSeriesPoint]) -> Result<()> {
    let mut report = SeriesReport::create(path)?;
    for point in series {
        report.writer.serialize(point)?;
    }
    report.writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    fn point(tick: u64, infected: usize) -> TimeSeriesPoint {
        TimeSeriesPoint {
            tick,
            susceptible: 10 - infected,
            exposed: 0,
            infected,
            recovered: 0,
        }
    }

    #[test]
    fn write_and_read_series() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("series.csv");
        let series = vec![point(0, 1), point(1, 3), point(2, 4)];
        write_series(&file_path, &series).unwrap();

        let contents = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(
            contents.lines().next(),
            Some("tick,susceptible,exposed,infected,recovered")
        );

        let mut reader = csv::Reader::from_path(&file_path).unwrap();
        let read: Vec<TimeSeriesPoint> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(read, series);
    }

    #[test]
    fn directory_creation_writing_works() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test-temp").join("series.csv");
        let mut report = SeriesReport::create(&file_path).unwrap();
        report.send(&point(0, 1)).unwrap();

        assert!(file_path.exists(), "CSV file should exist");
        let mut reader = csv::Reader::from_path(file_path).unwrap();
        let record: TimeSeriesPoint = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(record, point(0, 1));
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let res = SeriesReport::create(&temp_dir.path().join("series.tsv"));
        match res {
            Err(SeirError::ReportError(message)) => {
                assert!(message.contains("must be CSVs"));
            }
            _ => panic!("Other file types beyond CSV are not allowed"),
        }
    }
}
