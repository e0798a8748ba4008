pub mod errors;
pub mod models;

use std::path::Path;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use crate::manager_inverter::errors::IngestionError;
use crate::manager_inverter::models::{MonthlyRecord, Sample, TimeSeries};

/// Metadata rows preceding the header in the historical export
const HISTORY_SKIP_ROWS: usize = 2;
/// Metadata rows preceding the header in the monthly plant report
const MONTHLY_SKIP_ROWS: usize = 20;
/// Summary rows trailing the data in the monthly plant report
const MONTHLY_FOOTER_ROWS: usize = 1;

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

const TIME_COLUMN: &str = "Time";
const POWER_COLUMN: &str = "Power(W)";
const TOTAL_GENERATION_COLUMN: &str = "Total Generation(kWh)";
const MONTH_COLUMN: &str = "Date";
const MONTHLY_GENERATION_COLUMN: &str = "Generation(kWh)";

/// Loads and normalizes the historical inverter export
///
/// The returned series is sorted ascending by timestamp and every retained
/// sample has a parsed timestamp and numeric fields. Rows that fail to
/// parse are dropped individually and never abort the remaining rows.
///
/// # Arguments
///
/// * 'path' - resolved path to the export file
pub async fn load_history_export(path: &Path) -> Result<TimeSeries, IngestionError> {
    let bytes = read_export(path).await?;
    parse_history_export(&decode_latin1(&bytes))
}

/// Loads the monthly plant report
///
/// # Arguments
///
/// * 'path' - resolved path to the report file
pub async fn load_monthly_report(path: &Path) -> Result<Vec<MonthlyRecord>, IngestionError> {
    let bytes = read_export(path).await?;
    parse_monthly_report(&decode_latin1(&bytes))
}

async fn read_export(path: &Path) -> Result<Vec<u8>, IngestionError> {
    tokio::fs::read(path).await
        .map_err(|e| IngestionError::FileNotFound(format!("{}: {}", path.display(), e)))
}

/// Decodes a vendor export to text
///
/// The files come from Windows-locale tools in latin-1, where every byte
/// maps to the Unicode scalar of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn parse_history_export(text: &str) -> Result<TimeSeries, IngestionError> {
    let body = skip_metadata_rows(text, HISTORY_SKIP_ROWS)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()
        .map_err(|e| IngestionError::MalformedHeader(e.to_string()))?
        .clone();
    let time_idx = column_index(&headers, TIME_COLUMN)?;
    let power_idx = column_index(&headers, POWER_COLUMN)?;
    let total_idx = column_index(&headers, TOTAL_GENERATION_COLUMN)?;

    let mut samples: Vec<Sample> = Vec::new();
    let mut dropped: usize = 0;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("historical export: dropping unreadable row: {}", e);
                dropped += 1;
                continue;
            }
        };
        match parse_sample(&record, time_idx, power_idx, total_idx) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                debug!("historical export: dropping row: {}", e.0);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!("historical export: dropped {} unparseable row(s)", dropped);
    }
    if samples.is_empty() {
        return Err(IngestionError::EmptyAfterFiltering(
            "historical export: no row survived filtering".to_string(),
        ));
    }

    debug!("historical export: {} samples retained", samples.len());
    Ok(TimeSeries::from_samples(samples))
}

fn parse_monthly_report(text: &str) -> Result<Vec<MonthlyRecord>, IngestionError> {
    let body = skip_metadata_rows(text, MONTHLY_SKIP_ROWS)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()
        .map_err(|e| IngestionError::MalformedHeader(e.to_string()))?
        .clone();
    let month_idx = column_index(&headers, MONTH_COLUMN)?;
    let generation_idx = column_index(&headers, MONTHLY_GENERATION_COLUMN)?;

    let mut rows: Vec<StringRecord> = Vec::new();
    let mut dropped: usize = 0;
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record),
            Err(e) => {
                debug!("monthly report: dropping unreadable row: {}", e);
                dropped += 1;
            }
        }
    }

    // The vendor closes the report with a summary row, excluded before
    // per-row validation.
    let data_rows = rows.len().saturating_sub(MONTHLY_FOOTER_ROWS);

    let mut records_out: Vec<MonthlyRecord> = Vec::new();
    for record in &rows[..data_rows] {
        match parse_monthly_record(record, month_idx, generation_idx) {
            Ok(monthly) => records_out.push(monthly),
            Err(e) => {
                debug!("monthly report: dropping row: {}", e.0);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!("monthly report: dropped {} unparseable row(s)", dropped);
    }
    if records_out.is_empty() {
        return Err(IngestionError::EmptyAfterFiltering(
            "monthly report: no row survived filtering".to_string(),
        ));
    }

    Ok(records_out)
}

/// Drops the vendor banner rows preceding the header row
fn skip_metadata_rows(text: &str, count: usize) -> Result<&str, IngestionError> {
    let mut rest = text;
    for n in 0..count {
        match rest.split_once('\n') {
            Some((_, tail)) => rest = tail,
            None => {
                return Err(IngestionError::MalformedHeader(format!(
                    "file ends inside metadata (row {} of {})", n + 1, count,
                )));
            }
        }
    }
    Ok(rest)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, IngestionError> {
    headers.iter().position(|h| h.trim() == name)
        .ok_or_else(|| IngestionError::MalformedHeader(format!("missing column '{}'", name)))
}

#[derive(Debug)]
struct RowError(String);

fn parse_sample(
    record: &StringRecord,
    time_idx: usize,
    power_idx: usize,
    total_idx: usize,
) -> Result<Sample, RowError> {
    let raw_time = field(record, time_idx)?;
    let timestamp = NaiveDateTime::parse_from_str(raw_time.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| RowError(format!("timestamp '{}': {}", raw_time, e)))?;
    let instant_power_w = parse_decimal(field(record, power_idx)?)?;
    let cumulative_generation_kwh = parse_decimal(field(record, total_idx)?)?;

    Ok(Sample { timestamp, instant_power_w, cumulative_generation_kwh })
}

fn parse_monthly_record(
    record: &StringRecord,
    month_idx: usize,
    generation_idx: usize,
) -> Result<MonthlyRecord, RowError> {
    let month = normalize_month_label(field(record, month_idx)?.trim())?;
    let generation_kwh = parse_decimal(field(record, generation_idx)?)?;

    Ok(MonthlyRecord { month, generation_kwh })
}

fn field(record: &StringRecord, idx: usize) -> Result<&str, RowError> {
    record.get(idx).ok_or_else(|| RowError(format!("missing field {}", idx)))
}

/// Parses a decimal-comma numeric field ("1234,56")
///
/// The vendor writes the decimal separator as a comma; conversion replaces
/// it with a dot before parsing. A value carrying both separators, such as
/// "1.234,56", fails the parse and drops the row. Non-finite values are
/// rejected so decoding noise cannot poison the counter deltas.
fn parse_decimal(raw: &str) -> Result<f64, RowError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowError(format!("numeric '{}'", raw)))
}

/// Validates a month label and re-renders it zero-padded as MM.YYYY,
/// matching the report's own date column
fn normalize_month_label(raw: &str) -> Result<String, RowError> {
    let (month, year) = raw.split_once('.')
        .ok_or_else(|| RowError(format!("month '{}'", raw)))?;
    let month: u32 = month.trim().parse()
        .map_err(|_| RowError(format!("month '{}'", raw)))?;
    let year: i32 = year.trim().parse()
        .map_err(|_| RowError(format!("month '{}'", raw)))?;
    if !(1..=12).contains(&month) {
        return Err(RowError(format!("month '{}' out of range", raw)));
    }

    Ok(format!("{:02}.{:04}", month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY_FIXTURE: &str = "\
Plant Name: Good Energy;;
Export Time: 08.09.2025 01:50:49;;
Time;Power(W);Total Generation(kWh)
08.09.2025 05:30:00;1500,0;10,0
08.09.2025 06:00:00;1800,5;10,0
08.09.2025 06:30:00;2100,0;12,5
";

    fn monthly_fixture(rows: &str) -> String {
        let banner = "metadata;;\n".repeat(MONTHLY_SKIP_ROWS);
        format!("{}Date;Generation(kWh)\n{}Total;2260,0\n", banner, rows)
    }

    #[test]
    fn history_rows_parse_sorted() {
        let series = parse_history_export(HISTORY_FIXTURE).unwrap();
        let samples = series.samples();

        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(samples[0].instant_power_w, 1500.0);
        assert_eq!(samples[2].cumulative_generation_kwh, 12.5);
    }

    #[test]
    fn out_of_order_rows_are_sorted() {
        let text = "\
banner;;
banner;;
Time;Power(W);Total Generation(kWh)
08.09.2025 07:00:00;900,0;13,0
08.09.2025 05:00:00;100,0;10,0
";
        let series = parse_history_export(text).unwrap();
        assert_eq!(series.samples()[0].cumulative_generation_kwh, 10.0);
    }

    #[test]
    fn unparseable_rows_are_dropped_not_fatal() {
        let text = "\
banner;;
banner;;
Time;Power(W);Total Generation(kWh)
not a date;1500,0;10,0
08.09.2025 06:00:00;n/a;10,0
08.09.2025 06:30:00;2100,0;
08.09.2025 07:00:00;2100,0;12,5
";
        let series = parse_history_export(text).unwrap();
        assert_eq!(series.samples().len(), 1);
        assert_eq!(series.samples()[0].cumulative_generation_kwh, 12.5);
    }

    #[test]
    fn all_rows_dropped_is_an_error() {
        let text = "\
banner;;
banner;;
Time;Power(W);Total Generation(kWh)
not a date;x;y
";
        let err = parse_history_export(text).unwrap_err();
        assert!(matches!(err, IngestionError::EmptyAfterFiltering(_)));
    }

    #[test]
    fn wrong_skip_offset_is_malformed_header() {
        let text = "\
banner;;
Time;Power(W);Total Generation(kWh)
08.09.2025 06:00:00;1500,0;10,0
";
        // One banner row only, so the skip lands on the header itself and
        // the expected columns are missing.
        let err = parse_history_export(text).unwrap_err();
        assert!(matches!(err, IngestionError::MalformedHeader(_)));
    }

    #[test]
    fn truncated_metadata_is_malformed_header() {
        let err = parse_history_export("only one line").unwrap_err();
        assert!(matches!(err, IngestionError::MalformedHeader(_)));
    }

    #[test]
    fn decimal_comma_is_converted() {
        assert_eq!(parse_decimal("1234,56").unwrap(), 1234.56);
        assert_eq!(parse_decimal(" 0,0 ").unwrap(), 0.0);
    }

    #[test]
    fn plain_dot_decimal_still_parses() {
        assert_eq!(parse_decimal("12.34").unwrap(), 12.34);
    }

    #[test]
    fn mixed_separators_are_rejected() {
        assert!(parse_decimal("1.234,56").is_err());
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("NaN").is_err());
    }

    #[test]
    fn latin1_bytes_decode() {
        let bytes: &[u8] = &[b'E', b'n', b'e', b'r', b'g', b'i', b'a', b' ', 0xE9];
        assert_eq!(decode_latin1(bytes), "Energia \u{e9}");
    }

    #[test]
    fn monthly_report_drops_footer() {
        let report = monthly_fixture("09.2025;120,5\n10.2025;98,0\n");
        let records = parse_monthly_report(&report).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, "09.2025");
        assert_eq!(records[0].generation_kwh, 120.5);
        assert_eq!(records[1].generation_kwh, 98.0);
    }

    #[test]
    fn monthly_month_labels_are_zero_padded() {
        let report = monthly_fixture("9.2025;120,5\n");
        let records = parse_monthly_report(&report).unwrap();
        assert_eq!(records[0].month, "09.2025");
    }

    #[test]
    fn monthly_invalid_rows_are_dropped() {
        let report = monthly_fixture("13.2025;120,5\nbogus;1,0\n10.2025;98,0\n");
        let records = parse_monthly_report(&report).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].month, "10.2025");
    }

    #[test]
    fn monthly_with_only_footer_is_empty_error() {
        let report = monthly_fixture("");
        let err = parse_monthly_report(&report).unwrap_err();
        assert!(matches!(err, IngestionError::EmptyAfterFiltering(_)));
    }

    #[actix_web::test]
    async fn missing_file_is_file_not_found() {
        let err = load_history_export(Path::new("/nonexistent/export.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }
}
