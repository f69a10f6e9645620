// src/process/mod.rs
pub mod date_parser;
pub mod utils;

use chrono::{Local, TimeZone};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use date_parser::EpochError;
pub use utils::fixed_file_name;

/// Structural problems that stop a whole conversion. No output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("missing header or data rows")]
    MissingRows,
    #[error("time column not found")]
    TimeColumnNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Header plus every processed or passed-through row, joined by `\n`.
    pub text: String,
    /// Lines after the header, blank ones included.
    pub rows_processed: usize,
    /// Rows whose time value was present but could not be converted.
    pub conversion_errors: usize,
    /// Rows kept as-is because of a column-count mismatch or an empty time cell.
    pub passthrough_rows: usize,
}

/// Rewrites the `time` column of a CSV text from nanosecond epochs to
/// `YYYY-MM-DD HH:mm:ss.sss` in the configured zone.
#[derive(Debug, Clone)]
pub struct RowTimeConverter<Tz: TimeZone> {
    tz: Tz,
}

impl RowTimeConverter<Local> {
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl Default for RowTimeConverter<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> RowTimeConverter<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Convert a single `time` cell.
    pub fn convert_value(&self, raw: &str) -> Result<String, EpochError> {
        date_parser::nanos_to_timestamp(raw, &self.tz)
    }

    /// Convert a whole file's text.
    ///
    /// Fails only on structure (no data rows, no `time` column). Row-level
    /// problems never fail the call: the row is kept verbatim and, when the
    /// time value itself was bad, counted in `conversion_errors`.
    #[tracing::instrument(level = "info", skip_all, fields(bytes = raw_text.len()))]
    pub fn convert(&self, raw_text: &str) -> Result<ConversionResult, FormatError> {
        let lines: Vec<&str> = raw_text.trim().lines().collect();
        if lines.len() < 2 {
            return Err(FormatError::MissingRows);
        }

        let header_line = lines[0].trim();
        let headers = utils::parse_header(header_line);
        let time_idx = utils::find_time_column(&headers).ok_or(FormatError::TimeColumnNotFound)?;
        debug!(columns = headers.len(), time_idx, "parsed header");

        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        out.push(header_line.to_string());
        let mut conversion_errors = 0;
        let mut passthrough_rows = 0;

        for (i, raw_line) in lines.iter().enumerate().skip(1) {
            let line_no = i + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let mut cells = utils::split_cells(line);
            if cells.len() != headers.len() {
                warn!(
                    line_no,
                    found = cells.len(),
                    expected = headers.len(),
                    "column count mismatch; keeping row unchanged"
                );
                passthrough_rows += 1;
                out.push(line.to_string());
                continue;
            }

            let value = cells[time_idx].trim();
            if value.is_empty() {
                warn!(line_no, "empty time value; keeping row unchanged");
                passthrough_rows += 1;
                out.push(line.to_string());
                continue;
            }

            match self.convert_value(value) {
                Ok(formatted) => {
                    cells[time_idx] = formatted.as_str();
                    out.push(cells.join(","));
                }
                Err(err) => {
                    warn!(line_no, %err, "time conversion failed; keeping original value");
                    conversion_errors += 1;
                    out.push(line.to_string());
                }
            }
        }

        let result = ConversionResult {
            text: out.join("\n"),
            rows_processed: lines.len() - 1,
            conversion_errors,
            passthrough_rows,
        };
        info!(
            rows = result.rows_processed,
            errors = result.conversion_errors,
            passthrough = result.passthrough_rows,
            "conversion finished"
        );
        Ok(result)
    }
}

/// Convert using the executing environment's local time zone.
pub fn convert(raw_text: &str) -> Result<ConversionResult, FormatError> {
    RowTimeConverter::local().convert(raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::Utc;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,timefix::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn utc() -> RowTimeConverter<Utc> {
        RowTimeConverter::new(Utc)
    }

    #[test]
    fn converts_the_time_column() -> Result<()> {
        init_test_logging();
        let res = utc().convert("time,value\n1700000000000000000,42\n")?;
        assert_eq!(res.text, "time,value\n2023-11-14 22:13:20.000,42");
        assert_eq!(res.rows_processed, 1);
        assert_eq!(res.conversion_errors, 0);
        assert_eq!(res.passthrough_rows, 0);
        Ok(())
    }

    #[test]
    fn local_zone_keeps_the_fixed_shape() -> Result<()> {
        let res = convert("time,value\n1700000000000000000,42")?;
        let cell = res.text.lines().nth(1).unwrap().split(',').next().unwrap();
        // the local offset is unknown here, so only the layout is checked
        let layout: String = cell
            .chars()
            .map(|c| if c.is_ascii_digit() { 'd' } else { c })
            .collect();
        assert_eq!(layout, "dddd-dd-dd dd:dd:dd.ddd");
        assert!(cell.ends_with(".000"));
        assert_eq!(res.conversion_errors, 0);
        Ok(())
    }

    #[test]
    fn malformed_value_is_kept_and_counted() -> Result<()> {
        init_test_logging();
        let res = utc().convert("time,value\nabc,42\n")?;
        assert_eq!(res.text, "time,value\nabc,42");
        assert_eq!(res.conversion_errors, 1);
        Ok(())
    }

    #[test]
    fn column_mismatch_passes_through_uncounted() -> Result<()> {
        let res = utc().convert("time,value\n1700000000000000000,42,extra\n")?;
        assert_eq!(res.text, "time,value\n1700000000000000000,42,extra");
        assert_eq!(res.conversion_errors, 0);
        assert_eq!(res.passthrough_rows, 1);
        Ok(())
    }

    #[test]
    fn empty_time_cell_is_byte_identical() -> Result<()> {
        let res = utc().convert("value,time,note\n42, ,x\n7,,y")?;
        assert_eq!(res.text, "value,time,note\n42, ,x\n7,,y");
        assert_eq!(res.conversion_errors, 0);
        assert_eq!(res.passthrough_rows, 2);
        Ok(())
    }

    #[test]
    fn header_lookup_is_case_insensitive() -> Result<()> {
        for header in ["Time,value", "TIME,value", " tImE ,value"] {
            let res = utc().convert(&format!("{header}\n0,1"))?;
            assert!(res.text.ends_with("\n1970-01-01 00:00:00.000,1"), "{header}");
        }
        Ok(())
    }

    #[test]
    fn structural_failures() {
        assert_eq!(utc().convert(""), Err(FormatError::MissingRows));
        assert_eq!(utc().convert("  time,value \n\n  "), Err(FormatError::MissingRows));
        assert_eq!(
            utc().convert("timestamp,value\n1,2"),
            Err(FormatError::TimeColumnNotFound)
        );
    }

    #[test]
    fn handles_crlf_and_blank_lines() -> Result<()> {
        let res = utc().convert("\r\n id,time \r\n1,0\r\n\r\n2,bad\r\n3,1000000\r\n")?;
        assert_eq!(
            res.text,
            "id,time\n1,1970-01-01 00:00:00.000\n2,bad\n3,1970-01-01 00:00:00.001"
        );
        // the blank interior line is counted but not emitted
        assert_eq!(res.rows_processed, 4);
        assert_eq!(res.conversion_errors, 1);
        Ok(())
    }

    #[test]
    fn never_drops_or_duplicates_rows() -> Result<()> {
        let input = "a,time,b\n\
                     1,1700000000000000000,x\n\
                     2,not-a-number,y\n\
                     \n\
                     3,,z\n\
                     4,1700000000000000000\n\
                     5,99999999999999999999999999999999,w\n\
                     6,-5,v";
        let res = utc().convert(input)?;
        let data_in = input.lines().skip(1).filter(|l| !l.trim().is_empty()).count();
        let data_out = res.text.lines().skip(1).count();
        assert_eq!(data_in, data_out);
        assert_eq!(res.conversion_errors, 2);
        assert_eq!(res.passthrough_rows, 2);
        let ids: Vec<&str> = res
            .text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
        Ok(())
    }

    #[test]
    fn only_the_time_cell_changes() -> Result<()> {
        let res = utc().convert("x,time,y\n  a , 1700000000000000000 , b ")?;
        assert_eq!(res.text, "x,time,y\na ,2023-11-14 22:13:20.000, b");
        Ok(())
    }
}
