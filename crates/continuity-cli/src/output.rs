//! Result sinks: CSV (`story_id,prediction,rationale`) or JSON Lines.

use anyhow::Result;
use clap::ValueEnum;
use continuity_core::{Prediction, StoryJudgment};
use std::borrow::Cow;
use std::fmt;
use std::io::Write;

pub const CSV_HEADER: &str = "story_id,prediction,rationale";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

pub fn write_results<W: Write>(
    mut writer: W,
    records: &[StoryJudgment],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            writeln!(writer, "{}", CSV_HEADER)?;
            for record in records {
                writeln!(
                    writer,
                    "{},{},{}",
                    csv_field(&record.story_id),
                    record.prediction.label(),
                    csv_field(&record.rationale)
                )?;
            }
        }
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// RFC 4180 quoting: fields with a comma, quote or line break are quoted,
/// embedded quotes doubled.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Prediction counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub examples: usize,
    pub consistent: usize,
    pub inconsistent: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[StoryJudgment]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.examples += 1;
            match record.prediction {
                Prediction::Consistent => summary.consistent += 1,
                Prediction::Inconsistent => summary.inconsistent += 1,
            }
            summary
        })
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} examples: {} consistent, {} inconsistent",
            self.examples, self.consistent, self.inconsistent
        )
    }
}
