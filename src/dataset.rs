// =============================================================================
// Dataset I/O: raw OHLCV tables in, ML-ready feature tables out
// =============================================================================
//
// Raw files carry the header `Symbol,Date,Open,High,Low,Close,Volume`.  The
// feature table is written with the stable column order produced by
// `feature_columns`, floats in Rust's shortest round-trip form, so the same
// input always yields byte-identical output.
// =============================================================================

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::features::FeatureTable;
use crate::types::{MalformedRow, PriceRow, PriceTable, PRICE_COLUMNS};

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct SymbolDump {
    value: Vec<Map<String, Value>>,
}

/// Parse raw OHLCV rows from any CSV source.
///
/// A record that names its symbol but fails to parse (blank or non-numeric
/// price, bad date, missing field) is kept aside as a [`MalformedRow`] so
/// that only its symbol is rejected later.  A missing header column, an
/// unreadable record, or a bad record without a symbol fails the whole
/// source, naming the line (1-based, header included).
pub fn parse_price_rows<R: Read>(source: R) -> Result<PriceTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = reader.headers().context("failed to read price header")?.clone();

    let missing: Vec<&str> = PRICE_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        bail!("price header is missing column(s): {}", missing.join(", "));
    }
    let symbol_at = headers
        .iter()
        .position(|h| h == "Symbol")
        .context("price header has no Symbol column")?;

    let mut table = PriceTable::default();
    for (i, record) in reader.records().enumerate() {
        let fallback_line = i as u64 + 2;
        let record = record.with_context(|| format!("unreadable price record on line {fallback_line}"))?;
        let line = record.position().map_or(fallback_line, |p| p.line());

        match record.deserialize::<PriceRow>(Some(&headers)) {
            Ok(row) => table.rows.push(row),
            Err(e) => {
                let symbol = record
                    .get(symbol_at)
                    .filter(|s| !s.trim().is_empty())
                    .with_context(|| format!("malformed price row on line {line} has no symbol: {e}"))?;
                warn!(symbol = %symbol, line, error = %e, "malformed price row");
                table.malformed.push(MalformedRow {
                    symbol: symbol.to_string(),
                    line,
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(table)
}

/// Load a raw OHLCV CSV file.
pub fn read_price_rows(path: impl AsRef<Path>) -> Result<PriceTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let table = parse_price_rows(file).with_context(|| format!("failed to read {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = table.rows.len(),
        malformed = table.malformed.len(),
        "price rows loaded"
    );
    Ok(table)
}

/// Load the `symbol` column of a symbol list, skipping blanks.
pub fn read_symbols(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open symbol list {}", path.display()))?;
    let mut symbols = Vec::new();
    for record in reader.deserialize::<SymbolEntry>() {
        let entry = record.with_context(|| format!("malformed symbol list {}", path.display()))?;
        let symbol = entry.symbol.trim();
        if !symbol.is_empty() {
            symbols.push(symbol.to_string());
        }
    }
    debug!(path = %path.display(), count = symbols.len(), "symbol list loaded");
    Ok(symbols)
}

/// Flatten a symbol-metadata dump (`{"value": [{...}, ...]}`) into CSV with
/// one column per key.  List values are joined with commas; nested objects
/// are written as JSON text.  Returns the number of entries written.
pub fn symbols_json_to_csv<R: Read, W: Write>(source: R, writer: W) -> Result<usize> {
    let dump: SymbolDump = serde_json::from_reader(source).context("failed to parse symbol dump")?;

    let mut columns: Vec<&str> = Vec::new();
    for entry in &dump.value {
        for key in entry.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&columns).context("failed to write symbol header")?;
    for entry in &dump.value {
        let record = columns.iter().map(|c| entry.get(*c).map(cell_text).unwrap_or_default());
        writer.write_record(record).context("failed to write symbol entry")?;
    }
    writer.flush().context("failed to flush symbol list")?;
    Ok(dump.value.len())
}

/// Convert the symbol-metadata JSON at `input` into the CSV symbol list at
/// `output`.
pub fn convert_symbol_dump(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let source = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let sink = File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    let count = symbols_json_to_csv(source, sink)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    info!(input = %input.display(), output = %output.display(), count, "symbol list written");
    Ok(count)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Serialize `records` as CSV, with or without a header line.
pub fn write_records<W: Write, T: Serialize>(writer: W, records: &[T], with_header: bool) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(writer);
    for record in records {
        writer.serialize(record).context("failed to serialise CSV record")?;
    }
    writer.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Overwrite `path` with `records` and a header.
pub fn save_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_records(file, records, true).with_context(|| format!("failed to write {}", path.display()))
}

/// Append `records` to `path` without a header.
pub fn append_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {} for append", path.display()))?;
    write_records(file, records, false).with_context(|| format!("failed to append to {}", path.display()))
}

/// Create `path` holding only the raw OHLCV header, unless it already exists.
pub fn ensure_price_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(PRICE_COLUMNS)?;
    writer.flush()?;
    info!(path = %path.display(), "master price file created");
    Ok(())
}

/// Write the feature table as CSV to any sink.
pub fn write_feature_table<W: Write>(writer: W, table: &FeatureTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.columns).context("failed to write feature header")?;
    for row in &table.rows {
        let record = row.to_record();
        debug_assert_eq!(record.len(), table.columns.len());
        writer.write_record(&record).context("failed to write feature row")?;
    }
    writer.flush().context("failed to flush feature table")?;
    Ok(())
}

/// Write the feature table to `path`.
pub fn save_feature_table(path: impl AsRef<Path>, table: &FeatureTable) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_feature_table(file, table).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "feature table saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const RAW: &str = "\
Symbol,Date,Open,High,Low,Close,Volume
NABIL,2024-01-01,500,510,495,505,1200
NABIL,2024-01-02 00:00:00,505,512,500,510,1350.0
";

    #[test]
    fn parses_raw_rows() {
        let table = parse_price_rows(RAW.as_bytes()).unwrap();
        assert!(table.malformed.is_empty());
        let rows = table.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "NABIL");
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(rows[1].volume, 1350);
        assert!((rows[0].close - 505.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_row_is_set_aside_with_its_line() {
        let raw = "\
Symbol,Date,Open,High,Low,Close,Volume
NABIL,2024-01-01,500,510,495,,1200
NICA,2024-01-01,300,310,295,305,800
NABIL,2024-01-02,505,512,500,510
";
        let table = parse_price_rows(raw.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].symbol, "NICA");
        assert_eq!(table.malformed.len(), 2);
        assert_eq!(table.malformed[0].symbol, "NABIL");
        assert_eq!(table.malformed[0].line, 2);
        assert_eq!(table.malformed[1].line, 4);
        assert!(!table.malformed[0].message.is_empty());
    }

    #[test]
    fn malformed_row_without_symbol_is_error() {
        let raw = "Symbol,Date,Open,High,Low,Close,Volume\nNABIL,2024-01-01,500,510,495,505,1200\n,2024-01-02,x,510,495,505,1200\n";
        let err = parse_price_rows(raw.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"), "{err:#}");
    }

    #[test]
    fn missing_column_is_error() {
        let raw = "Symbol,Date,Open,High,Low,Close\nNABIL,2024-01-01,500,510,495,505\n";
        assert!(parse_price_rows(raw.as_bytes()).is_err());
    }

    #[test]
    fn save_and_append_records() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.csv");
        ensure_price_file(&master).unwrap();
        ensure_price_file(&master).unwrap();

        let rows = parse_price_rows(RAW.as_bytes()).unwrap().rows;
        append_records(&master, &rows).unwrap();
        append_records(&master, &rows[..1]).unwrap();

        let reloaded = read_price_rows(&master).unwrap().rows;
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded[0], rows[0]);

        let single = dir.path().join("NABIL.csv");
        save_records(&single, &rows).unwrap();
        save_records(&single, &rows[..1]).unwrap();
        assert_eq!(read_price_rows(&single).unwrap().rows.len(), 1);
    }

    #[test]
    fn reads_symbol_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_symbol_list.csv");
        std::fs::write(&path, "symbol,name\nNABIL,Nabil Bank\n,\n NICA ,NIC Asia\n").unwrap();
        assert_eq!(read_symbols(&path).unwrap(), vec!["NABIL", "NICA"]);
    }

    #[test]
    fn symbol_dump_becomes_symbol_list() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("stock.json");
        let csv_path = dir.path().join("stocks.csv");
        std::fs::write(
            &json,
            r#"{"value": [
                {"symbol": "NABIL", "name": "Nabil Bank", "logo_urls": ["a.png", "b.png"], "listed": 1984},
                {"symbol": "NICA", "name": "NIC Asia", "logo_urls": null, "sector": "Banking"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(convert_symbol_dump(&json, &csv_path).unwrap(), 2);
        assert_eq!(read_symbols(&csv_path).unwrap(), vec!["NABIL", "NICA"]);

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.contains("\"a.png,b.png\""), "{text}");
        assert!(text.lines().next().unwrap().contains("sector"));
    }

    #[test]
    fn symbol_dump_without_value_is_error() {
        assert!(symbols_json_to_csv(r#"{"items": []}"#.as_bytes(), Vec::new()).is_err());
    }
}
