//! CSV export of the ranked word table and its inline-download encodings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::frequency::{parse_percent_label, RankedRow};
use crate::error::{Result, WordFreqError};

pub const CSV_HEADER: [&str; 4] = ["Rank", "Word", "Frequency", "% of Text"];
pub const DATA_URI_PREFIX: &str = "data:file/csv;base64,";
pub const EXPORT_FILENAME: &str = "word_list.csv";

/// Serialize rows to CSV, header first, in the given order.
pub fn encode_csv(rows: &[RankedRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, &CSV_HEADER);
    for row in rows {
        let rank = row.rank.to_string();
        let frequency = row.frequency.to_string();
        let percent = row.percent_label();
        push_record(&mut out, &[&rank, &row.word, &frequency, &percent]);
    }
    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

/// `data:file/csv;base64,...` link target for the CSV.
pub fn to_data_uri(csv: &str) -> String {
    format!("{DATA_URI_PREFIX}{}", STANDARD.encode(csv.as_bytes()))
}

/// HTML anchor offering the table as `word_list.csv`.
pub fn download_link(rows: &[RankedRow]) -> String {
    let uri = to_data_uri(&encode_csv(rows));
    format!(r#"<a href="{uri}" download="{EXPORT_FILENAME}">Download CSV</a>"#)
}

/// Decode a data URI produced by [`to_data_uri`] back into CSV text.
pub fn decode_data_uri(uri: &str) -> Result<String> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| WordFreqError::Export(format!("expected '{DATA_URI_PREFIX}' prefix")))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| WordFreqError::Export(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| WordFreqError::Export(format!("utf-8: {e}")))
}

/// Parse CSV produced by [`encode_csv`] back into rows.
pub fn decode_csv(csv: &str) -> Result<Vec<RankedRow>> {
    let records = split_records(csv)?;
    let mut iter = records.into_iter();
    match iter.next() {
        Some(header) if header == CSV_HEADER => {}
        Some(header) => {
            return Err(WordFreqError::Export(format!(
                "unexpected header {header:?}"
            )))
        }
        None => return Err(WordFreqError::Export("missing header".into())),
    }

    iter.enumerate()
        .map(|(i, fields)| {
            let line = i + 2;
            let [rank, word, frequency, percent]: [String; 4] =
                fields.try_into().map_err(|f: Vec<String>| {
                    WordFreqError::Export(format!("line {line}: expected 4 fields, got {}", f.len()))
                })?;
            let bad = |what: &str| WordFreqError::Export(format!("line {line}: bad {what}"));
            Ok(RankedRow {
                rank: rank.parse().map_err(|_| bad("rank"))?,
                word,
                frequency: frequency.parse().map_err(|_| bad("frequency"))?,
                percentage: parse_percent_label(&percent).ok_or_else(|| bad("percentage"))?,
            })
        })
        .collect()
}

/// Split CSV text into records, honoring double-quoted fields.
fn split_records(csv: &str) -> Result<Vec<Vec<String>>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                other => field.push(other),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => quoted = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
            }
            other => field.push(other),
        }
    }
    if quoted {
        return Err(WordFreqError::Export("unterminated quoted field".into()));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    Ok(records)
}
