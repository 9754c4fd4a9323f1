//! CSV rendering for CLI query output (§4.K/§6.2): a `DATE` column followed
//! by one column per requested variable, `NA` for missing/NaN, floats
//! rendered at the requested precision with trailing zeros trimmed.

use ingestion::QueryResult;

/// Render a query result as CSV text, one row per date.
pub fn render_csv(result: &QueryResult, precision: usize) -> String {
    let mut out = String::new();

    out.push_str("DATE");
    for name in &result.variables {
        out.push(',');
        out.push_str(name);
    }
    out.push('\n');

    for (day, date) in result.dates.iter().enumerate() {
        out.push_str(&date.format("%Y-%m-%d").to_string());
        for column in &result.values {
            out.push(',');
            let value = column.get(day).copied().unwrap_or(f32::NAN);
            out.push_str(&format_value(value, precision));
        }
        out.push('\n');
    }

    out
}

fn format_value(value: f32, precision: usize) -> String {
    if value.is_nan() {
        return "NA".to_string();
    }
    trim_trailing_zeros(&format!("{value:.precision$}"))
}

fn trim_trailing_zeros(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> QueryResult {
        QueryResult {
            dates: vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            ],
            variables: vec!["TMP".to_string(), "PRATE".to_string()],
            values: vec![vec![12.5, f32::NAN], vec![0.0, 3.25]],
        }
    }

    #[test]
    fn header_lists_date_then_variables_in_order() {
        let csv = render_csv(&sample(), 2);
        assert!(csv.starts_with("DATE,TMP,PRATE\n"));
    }

    #[test]
    fn nan_renders_as_na() {
        let csv = render_csv(&sample(), 2);
        assert!(csv.lines().nth(2).unwrap().ends_with(",NA"));
    }

    #[test]
    fn trailing_zeros_are_trimmed() {
        assert_eq!(format_value(0.0, 3), "0");
        assert_eq!(format_value(3.25, 4), "3.25");
        assert_eq!(format_value(12.5, 2), "12.5");
    }

    #[test]
    fn precision_controls_decimal_places_before_trimming() {
        assert_eq!(format_value(1.0 / 3.0, 2), "0.33");
        assert_eq!(format_value(1.0 / 3.0, 6), "0.333333");
    }
}
