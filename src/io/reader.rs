//! Streaming journal reader
//!
//! Provides an iterator over journal records from a CSV file, delegating
//! format concerns to the csv_format module. Records are read and converted
//! one at a time; the file is never loaded whole.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as `Err` items carrying the line
//!   number, so the caller can log them and keep going

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::OperationRecord;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Iterator over the records of a journal file
#[derive(Debug)]
pub struct OperationReader {
    reader: csv::Reader<File>,
    /// Data rows consumed so far (the header is line 1)
    rows_read: usize,
}

impl OperationReader {
    /// Open a journal file
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be absent)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV journal
    ///
    /// # Returns
    ///
    /// * `Ok(OperationReader)` if the file opened successfully
    /// * `Err(String)` if the file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            rows_read: 0,
        })
    }
}

impl Iterator for OperationReader {
    type Item = Result<OperationRecord, String>;

    /// Next journal record
    ///
    /// # Returns
    ///
    /// * `Some(Ok(OperationRecord))` - Successfully parsed record
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let next = self.reader.deserialize::<CsvRecord>().next()?;
        self.rows_read += 1;
        let line = self.rows_read + 1;

        Some(match next {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
