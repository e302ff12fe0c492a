//! Batch driver over CSV datasets
//!
//! Reads rows carrying an identifier and an embedded JSON payload, runs
//! each payload through the [`RecordProcessor`] and writes one output row
//! per input row. Rows are independent; nothing carries over between them.

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::{PiiError, Result};
use crate::processor::RecordProcessor;
use crate::record::{error_record, parse_payload, to_json_string, Record};

/// Output header, in column order
pub const OUTPUT_HEADER: [&str; 3] = ["record_id", "redacted_data_json", "is_pii"];

/// Counts collected over one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows read
    pub total: usize,
    /// Rows flagged as PII
    pub pii: usize,
    /// Rows whose payload could not be parsed
    pub invalid: usize,
}

/// Result of processing one row payload
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    /// Redacted record, or the error marker for an invalid payload
    pub record: Record,
    pub is_pii: bool,
    /// Payload was missing or could not be parsed
    pub invalid: bool,
}

/// CSV-to-CSV redaction pass
#[derive(Debug, Clone)]
pub struct BatchProcessor<'a> {
    processor: RecordProcessor<'a>,
    id_column: String,
    data_column: String,
}

impl BatchProcessor<'static> {
    /// Builtin field table with the default column names
    pub fn builtin() -> Self {
        let config = ScanConfig::default();
        Self::new(RecordProcessor::builtin(), &config)
    }
}

impl<'a> BatchProcessor<'a> {
    pub fn new(processor: RecordProcessor<'a>, config: &ScanConfig) -> Self {
        Self {
            processor,
            id_column: config.id_column.clone(),
            data_column: config.data_column.clone(),
        }
    }

    /// Process one raw payload.
    ///
    /// A missing or unparseable payload yields the error marker record and
    /// is reported as non-PII without being classified.
    pub fn process_payload(&self, payload: Option<&str>) -> RowOutcome {
        match parse_row(payload) {
            Some(record) => {
                let (record, is_pii) = self.processor.classify_and_redact(&record);
                RowOutcome {
                    record,
                    is_pii,
                    invalid: false,
                }
            }
            None => RowOutcome {
                record: error_record(),
                is_pii: false,
                invalid: true,
            },
        }
    }

    /// Stream rows from `input` to `output`
    pub fn process_reader<R: io::Read, W: io::Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<BatchSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(input);
        let headers = reader.headers()?.clone();
        let id_idx = column_index(&headers, &self.id_column)?;
        let data_idx = column_index(&headers, &self.data_column)?;

        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(OUTPUT_HEADER)?;

        let mut summary = BatchSummary::default();
        for row in reader.records() {
            let row = row?;
            let record_id = row.get(id_idx).unwrap_or_default();
            let payload = row.get(data_idx).filter(|p| !p.is_empty());

            let outcome = self.process_payload(payload);
            if outcome.invalid {
                warn!(record_id, "Invalid JSON payload, emitting error marker");
                summary.invalid += 1;
            }

            summary.total += 1;
            if outcome.is_pii {
                summary.pii += 1;
            }

            writer.write_record([
                record_id,
                to_json_string(&outcome.record)?.as_str(),
                if outcome.is_pii { "True" } else { "False" },
            ])?;
        }
        writer.flush()?;

        info!(
            total = summary.total,
            pii = summary.pii,
            invalid = summary.invalid,
            "Batch complete"
        );
        Ok(summary)
    }

    /// Process `input` into a new file at `output`
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<BatchSummary> {
        let reader = File::open(input)?;
        let writer = File::create(output)?;
        debug!(input = %input.display(), output = %output.display(), "Starting batch");
        self.process_reader(reader, writer)
    }
}

fn parse_row(payload: Option<&str>) -> Option<Record> {
    match payload.map(parse_payload)? {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "Payload rejected");
            None
        }
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PiiError::MissingColumn(name.to_string()))
}
