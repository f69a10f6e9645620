/// Field separator. Quoting is not understood: every comma splits.
pub const DELIMITER: char = ',';

/// Name of the column holding nanosecond epochs, matched ignoring ASCII case.
pub const TIME_COLUMN: &str = "time";

/// Split one line into raw cells on every comma.
pub fn split_cells(line: &str) -> Vec<&str> {
    line.split(DELIMITER).collect()
}

/// Parse the header line into trimmed column names.
pub fn parse_header(line: &str) -> Vec<String> {
    split_cells(line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect()
}

/// Position of the first `time` column, if any.
pub fn find_time_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(TIME_COLUMN))
}

/// `data.CSV` → `data_fixed.csv`; names without a `.csv` suffix just get one appended.
pub fn fixed_file_name(original: &str) -> String {
    let base = if has_csv_extension(original) {
        &original[..original.len() - 4]
    } else {
        original
    };
    format!("{}_fixed.csv", base)
}

pub fn has_csv_extension(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case_and_padding() {
        for line in ["time,value", " Time ,value", "value,TIME", "a,b,tImE"] {
            let headers = parse_header(line);
            assert!(find_time_column(&headers).is_some(), "{line}");
        }
        assert_eq!(find_time_column(&parse_header("value, TIME ,time")), Some(1));
        assert_eq!(find_time_column(&parse_header("timestamp,value")), None);
    }

    #[test]
    fn splits_naively_on_commas() {
        assert_eq!(split_cells(r#""a,b",c"#), vec![r#""a"#, r#"b""#, "c"]);
        assert_eq!(split_cells("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn fixed_names() {
        assert_eq!(fixed_file_name("trace.csv"), "trace_fixed.csv");
        assert_eq!(fixed_file_name("TRACE.CSV"), "TRACE_fixed.csv");
        assert_eq!(fixed_file_name("trace.Csv"), "trace_fixed.csv");
        assert_eq!(fixed_file_name("trace.txt"), "trace.txt_fixed.csv");
        assert_eq!(fixed_file_name("csv"), "csv_fixed.csv");
        assert_eq!(fixed_file_name(".csv"), "_fixed.csv");
        assert_eq!(fixed_file_name("données.csv"), "données_fixed.csv");
    }
}
