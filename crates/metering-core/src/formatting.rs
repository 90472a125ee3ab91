/// Format a floating-point number with thousands separators and a fixed
/// number of decimal places.
///
/// Report columns use four decimals; counts use zero.
///
/// # Examples
///
/// ```
/// use metering_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 4), "1,234.5000");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.prec$}", value, prec = decimals);
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let grouped = group_thousands(int_part);
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Insert `,` separators into a plain digit string, grouping by three from
/// the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_small() {
        assert_eq!(format_number(0.0, 4), "0.0000");
        assert_eq!(format_number(9.5, 4), "9.5000");
        assert_eq!(format_number(999.0, 0), "999");
    }

    #[test]
    fn test_format_number_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
        assert_eq!(format_number(44_640.0, 0), "44,640");
        assert_eq!(format_number(1_234_567.891, 4), "1,234,567.8910");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-1_234.5, 2), "-1,234.50");
    }

    #[test]
    fn test_format_number_rounds_to_decimals() {
        assert_eq!(format_number(1.23456, 4), "1.2346");
    }

    #[test]
    fn test_group_thousands_boundaries() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("12"), "12");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
