use crate::assembler::ResultRow;
use crate::error::Result;
use crate::sentiment::{SentimentClassifier, SentimentLabel};
use crate::twitter_client::api;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Input to [save]; sentiment is filled in when missing.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub text: String,
    pub sentiment: Option<SentimentLabel>,
    pub created_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
}

impl From<ResultRow> for Record {
    fn from(row: ResultRow) -> Self {
        Self {
            text: row.text,
            sentiment: Some(row.sentiment),
            created_at: row.created_at,
            author_id: row.author_id,
        }
    }
}

impl From<api::Tweet> for Record {
    fn from(tweet: api::Tweet) -> Self {
        Self {
            text: tweet.text,
            sentiment: None,
            created_at: tweet.created_at,
            author_id: tweet.author_id,
        }
    }
}

/// Rows as written to (or read back from) a CSV file.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub path: PathBuf,
    pub rows: Vec<ResultRow>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize::<ResultRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Dedupes by text, tags anything untagged, and writes `text,sentiment,created_at,author_id`
/// with a header row.
pub fn save<R, I>(
    rows: I,
    destination: impl AsRef<Path>,
    classifier: &SentimentClassifier,
) -> Result<Dataset>
where
    R: Into<Record>,
    I: IntoIterator<Item = R>,
{
    let rows: Vec<ResultRow> = rows
        .into_iter()
        .map(Into::into)
        .unique_by(|record: &Record| record.text.clone())
        .map(|record| ResultRow {
            sentiment: record
                .sentiment
                .unwrap_or_else(|| classifier.classify(&record.text)),
            text: record.text,
            created_at: record.created_at,
            author_id: record.author_id,
        })
        .collect();

    let path = destination.as_ref().to_path_buf();
    let file = File::create(&path)?;
    write_csv(file, &rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "saved dataset");

    Ok(Dataset { path, rows })
}

/// Same layout as [save], to any writer.
pub fn write_csv<W: Write>(writer: W, rows: &[ResultRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // NB: write the header by hand so an empty dataset still gets one
    writer.write_record(["text", "sentiment", "created_at", "author_id"])?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Count per label; every label is present, possibly with zero.
pub fn distribution(dataset: &Dataset) -> BTreeMap<SentimentLabel, usize> {
    let mut counts: BTreeMap<SentimentLabel, usize> =
        SentimentLabel::ALL.iter().map(|label| (*label, 0)).collect();
    for row in &dataset.rows {
        *counts.entry(row.sentiment).or_default() += 1;
    }
    counts
}

pub fn percentages(counts: &BTreeMap<SentimentLabel, usize>) -> BTreeMap<SentimentLabel, f64> {
    let total: usize = counts.values().sum();
    counts
        .iter()
        .map(|(label, count)| {
            let pct = if total == 0 {
                0.0
            } else {
                *count as f64 * 100.0 / total as f64
            };
            (*label, pct)
        })
        .collect()
}
