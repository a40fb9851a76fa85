use chrono::NaiveDate;

/// Format a USD amount with a thousands separator and two decimals, e.g. `$1,234.50`
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let grouped = group_thousands(whole);
    if negative {
        format!("-${}.{:02}", grouped, frac)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

/// Format an integer count with a thousands separator, e.g. `456,321`
pub fn format_count(value: u64) -> String {
    group_thousands(value)
}

/// Long-form date for chart labels and notification bodies, e.g. `October 4, 2024`
pub fn format_date_long(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// URL path segment for a TLD: strip the leading dot, lowercase
pub fn tld_path(tld: &str) -> String {
    tld.trim_start_matches('.').to_lowercase()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-10.0), "-$10.00");
        assert_eq!(format_currency(7.5), "$7.50");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(456321), "456,321");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_format_date_long() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 4).unwrap();
        assert_eq!(format_date_long(date), "October 4, 2024");
    }

    #[test]
    fn test_tld_path() {
        assert_eq!(tld_path(".COM"), "com");
        assert_eq!(tld_path(".africa"), "africa");
        assert_eq!(tld_path("net"), "net");
    }
}
