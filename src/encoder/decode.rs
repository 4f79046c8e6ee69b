//! CSV row decoder for encoded streams.
//!
//! Reads back what [`super::RowBuffer`] writes: quoted fields with doubled
//! quotes, newline-separated records, no header.

use super::{CsvFormat, ROW_SEPARATOR};

/// Decode CSV bytes into rows of fields
pub fn decode_rows(data: &[u8], format: CsvFormat) -> anyhow::Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    if data.is_empty() {
        return Ok(rows);
    }

    let delimiter = format.delimiter();
    let quote = format.quote();

    let mut row: Vec<String> = Vec::new();
    let mut field: Vec<u8> = Vec::new();
    let mut in_quotes = false;
    let mut pos = 0;

    while pos < data.len() {
        let b = data[pos];
        if in_quotes {
            if b == quote {
                if data.get(pos + 1) == Some(&quote) {
                    field.push(quote);
                    pos += 1;
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(b);
            }
        } else if b == quote {
            in_quotes = true;
        } else if b == delimiter {
            row.push(take_field(&mut field)?);
        } else if b == ROW_SEPARATOR {
            row.push(take_field(&mut field)?);
            rows.push(std::mem::take(&mut row));
        } else {
            field.push(b);
        }
        pos += 1;
    }

    if in_quotes {
        anyhow::bail!("unterminated quoted field in row {}", rows.len() + 1);
    }

    // A terminating newline closes the last record; otherwise it is still open.
    if data.last() != Some(&ROW_SEPARATOR) {
        row.push(take_field(&mut field)?);
        rows.push(row);
    }

    Ok(rows)
}

fn take_field(field: &mut Vec<u8>) -> anyhow::Result<String> {
    let bytes = std::mem::take(field);
    String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("field is not valid UTF-8: {}", e))
}
