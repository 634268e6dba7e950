// Presentation helpers for records coming back from `/getall` and
// `/getfull`: timestamp cleanup, a plain-text table, and file export.

use crate::outcome::StoredRecord;
use anyhow::{Context, Result};
use chrono::DateTime;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EMPTY_MESSAGE: &str = "No data found in the database.";

/// File formats offered for exporting every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "output.json",
            ExportFormat::Yaml => "output.yaml",
        }
    }
}

/// Render a backend timestamp such as
/// `2025-07-27T09:48:50.883175427Z[Etc/UTC]` as `2025-07-27 09:48:50 UTC`.
/// Anything that doesn't parse is returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    let stamp = match raw.find('[') {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    match DateTime::parse_from_rfc3339(stamp.trim()) {
        Ok(dt) => dt
            .naive_utc()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        Err(e) => {
            warn!("Error parsing timestamp '{}': {}", raw, e);
            raw.to_string()
        }
    }
}

/// Values print bare when they're strings, as compact JSON otherwise.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Table with one row per record: key, value, last change.
pub fn render_records(records: &[StoredRecord]) -> String {
    if records.is_empty() {
        info!("No data found in database");
        return EMPTY_MESSAGE.to_string();
    }
    info!("Formatting {} records for display", records.len());

    let header = ["key", "value", "lastchange"];
    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|r| {
            [
                r.key.clone(),
                format_value(&r.value),
                r.lastchange
                    .as_deref()
                    .map(format_timestamp)
                    .unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("-+-").as_str());
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// Multi-line view of a single record with its metadata.
pub fn render_record(record: &StoredRecord) -> String {
    let changed = record
        .lastchange
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Key:          {}\nValue:        {}\nLast changed: {}",
        record.key,
        format_value(&record.value),
        changed
    )
}

/// Write the records to `<dir>/output.json` or `<dir>/output.yaml`.
pub fn export_records(
    records: &[StoredRecord],
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf> {
    match format {
        ExportFormat::Json => export_json(records, dir),
        ExportFormat::Yaml => export_yaml(records, dir),
    }
}

/// Write the records as pretty JSON to `<dir>/output.json`.
pub fn export_json(records: &[StoredRecord], dir: &Path) -> Result<PathBuf> {
    let (path, mut writer) = create_export(dir, ExportFormat::Json)?;
    serde_json::to_writer_pretty(&mut writer, records).context("Serializing records")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Write the records as YAML to `<dir>/output.yaml`.
pub fn export_yaml(records: &[StoredRecord], dir: &Path) -> Result<PathBuf> {
    let (path, mut writer) = create_export(dir, ExportFormat::Yaml)?;
    serde_yaml::to_writer(&mut writer, records).context("Serializing records as YAML")?;
    writer.flush()?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(path)
}

fn create_export(dir: &Path, format: ExportFormat) -> Result<(PathBuf, BufWriter<File>)> {
    let path = dir.join(format.file_name());
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok((path, BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, value: Value, lastchange: Option<&str>) -> StoredRecord {
        StoredRecord {
            key: key.to_string(),
            value,
            lastchange: lastchange.map(String::from),
        }
    }

    #[test]
    fn backend_timestamps_are_cleaned_up() {
        assert_eq!(
            format_timestamp("2025-07-27T09:48:50.883175427Z[Etc/UTC]"),
            "2025-07-27 09:48:50 UTC"
        );
        assert_eq!(
            format_timestamp("2025-07-27T11:48:50+02:00"),
            "2025-07-27 09:48:50 UTC"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn empty_table() {
        assert_eq!(render_records(&[]), EMPTY_MESSAGE);
    }

    #[test]
    fn table_aligns_columns() {
        let table = render_records(&[
            record("user1", json!("john"), Some("2025-07-27T10:15:30.123Z[UTC]")),
            record("n", json!({"a": 1}), None),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("key   | value   | lastchange"));
        assert!(lines[2].contains("2025-07-27 10:15:30 UTC"));
        assert!(lines[3].starts_with("n     | {\"a\":1}"));
    }

    #[test]
    fn single_record_view() {
        let text = render_record(&record("k", json!("v"), None));
        assert!(text.contains("Key:          k"));
        assert!(text.ends_with("unknown"));
    }

    #[test]
    fn export_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("a", json!("1"), Some("2025-07-27T09:48:50Z"))];
        let path = export_json(&records, dir.path()).unwrap();

        assert_eq!(path, dir.path().join("output.json"));
        let written: Vec<StoredRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, records);
    }

    #[test]
    fn export_writes_yaml_list() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("a", json!("1.50"), Some("2025-07-27T09:48:50Z")),
            record("b", json!({"nested": true}), None),
        ];
        let path = export_records(&records, dir.path(), ExportFormat::Yaml).unwrap();

        assert_eq!(path, dir.path().join("output.yaml"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("key: a"));
        let written: Vec<StoredRecord> = serde_yaml::from_str(&text).unwrap();
        assert_eq!(written, records);
    }
}
