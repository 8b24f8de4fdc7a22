use crate::assembler::ResultRow;
use crate::sentiment::SentimentLabel;
use crate::session_gate::QuotaStatus;
use crate::store::percentages;
use anyhow::Result;
use crossterm::queue;
use crossterm::style::{self, Color};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use unicode_truncate::UnicodeTruncateStr;

const LABEL_WIDTH: usize = 10;

fn label_color(label: SentimentLabel) -> Color {
    match label {
        SentimentLabel::Positive => Color::Green,
        SentimentLabel::Neutral => Color::Yellow,
        SentimentLabel::Negative => Color::Red,
    }
}

/// One tweet per line: "⏎ " stands in for line breaks.
pub fn flatten_text(text: &str) -> Cow<'_, str> {
    // CR-soon: compile once if this ever shows up in a profile
    let re_newlines = Regex::new(r"[\r\n]+").unwrap();
    re_newlines.replace_all(text, "⏎ ")
}

pub fn render_rows<W: Write>(out: &mut W, rows: &[ResultRow], width: usize) -> Result<()> {
    let text_width = width.saturating_sub(LABEL_WIDTH);

    for row in rows {
        let label = format!("{:<width$}", row.sentiment.as_str(), width = LABEL_WIDTH);
        queue!(out, style::SetForegroundColor(label_color(row.sentiment)))?;
        queue!(out, style::Print(label))?;
        queue!(out, style::ResetColor)?;

        let flattened = flatten_text(&row.text);
        let (truncated, _) = flattened.unicode_truncate(text_width);
        if truncated.len() < flattened.len() && text_width > 0 {
            let (shorter, _) = flattened.unicode_truncate(text_width - 1);
            queue!(out, style::Print(format!("{shorter}…\r\n")))?;
        } else {
            queue!(out, style::Print(format!("{truncated}\r\n")))?;
        }
    }

    out.flush()?;
    Ok(())
}

pub fn render_distribution<W: Write>(
    out: &mut W,
    counts: &BTreeMap<SentimentLabel, usize>,
) -> Result<()> {
    let pct = percentages(counts);
    for (label, count) in counts {
        queue!(out, style::SetForegroundColor(label_color(*label)))?;
        queue!(
            out,
            style::Print(format!("{label}: {count} tweets ({:.1}%)\r\n", pct[label]))
        )?;
        queue!(out, style::ResetColor)?;
    }
    out.flush()?;
    Ok(())
}

pub fn describe_quota(quota: QuotaStatus) -> String {
    match quota {
        QuotaStatus::Unlimited => "No bearer tokens configured; using mock tweets".to_string(),
        QuotaStatus::Available { remaining, total } => {
            format!("Requests available: {remaining}/{total}")
        }
        QuotaStatus::CoolingDown { minutes_left } => {
            format!("All requests used. Cooldown: ~{minutes_left} minutes left")
        }
    }
}
