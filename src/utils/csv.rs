//! Minimal quote-aware CSV reading/writing for the sample-file fallback and
//! the export path.

use std::fs;
use std::io;
use std::path::Path;

/// Parses CSV content into records. Handles quoted fields, escaped quotes
/// ("") and newlines inside quotes. Empty trailing lines are skipped.
pub fn parse(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// Reads a CSV file into (headers, rows). An empty file yields empty headers.
pub fn read_file(path: &Path) -> io::Result<(Vec<String>, Vec<Vec<String>>)> {
    let content = fs::read_to_string(path)?;
    let mut records = parse(&content).into_iter();
    let headers = records.next().unwrap_or_default();
    Ok((headers, records.collect()))
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Formats headers and rows as CSV text.
pub fn format(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(","));
    out.push('\n');
    for row in rows {
        out.push_str(&row.iter().map(|f| escape(f)).collect::<Vec<_>>().join(","));
        out.push('\n');
    }
    out
}

pub fn write_file(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    fs::write(path, format(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let records = parse("a,b,c\n1,2,3\n");
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let records = parse("text,label\n\"hello, world\",pos\n\"say \"\"hi\"\"\",neg\n");
        assert_eq!(records[1], vec!["hello, world", "pos"]);
        assert_eq!(records[2], vec!["say \"hi\"", "neg"]);
    }

    #[test]
    fn test_parse_newline_in_quotes() {
        let records = parse("text,label\n\"line one\nline two\",pos\n");
        assert_eq!(records[1][0], "line one\nline two");
    }

    #[test]
    fn test_parse_missing_trailing_newline() {
        let records = parse("a,b\n1,2");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["1", "2"]);
    }

    #[test]
    fn test_format_round_trip() {
        let headers = ["text", "sentiment"];
        let rows = vec![
            vec!["plain".to_string(), "neutral".to_string()],
            vec!["with, comma \"q\"".to_string(), "positive".to_string()],
        ];
        let formatted = format(&headers, &rows);
        let parsed = parse(&formatted);
        assert_eq!(parsed[0], vec!["text", "sentiment"]);
        assert_eq!(parsed[2], vec!["with, comma \"q\"", "positive"]);
    }
}
