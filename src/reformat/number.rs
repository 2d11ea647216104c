//! Numeric cell formatting: rounding, fixed precision, adaptive significant
//! digits, width and thousands grouping.

use super::{CellFormat, Rounding};

/// Decimal places that show `digits` significant digits of `v`, never less
/// than zero. Values below one keep `digits` decimals so a leading `0.` does
/// not eat into them.
pub fn adaptive_precision(v: f64, digits: u32) -> usize {
    let a = v.abs();
    if a < 1.0 {
        return digits as usize;
    }
    let magnitude = a.log10().floor() as i64;
    (digits as i64 - 1 - magnitude).max(0) as usize
}

/// Insert `sep` between groups of three integer digits.
pub fn group_thousands(text: &str, sep: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int, frac) = match rest.find('.') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3 * sep.len());
    let n = int.chars().count();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (n - i) % 3 == 0 {
            grouped.push_str(sep);
        }
        grouped.push(c);
    }
    format!("{}{}{}", sign, grouped, frac)
}

/// Format the numeric value `v` parsed from `text`. When the format asks for
/// no numeric change the original text is returned untouched.
pub fn format_number(text: &str, mut v: f64, fmt: &CellFormat) -> String {
    let mut precision = fmt.precision;

    match fmt.round {
        Some(Rounding::Floor) => {
            v = v.floor();
            precision.get_or_insert(0);
        }
        Some(Rounding::Ceil) => {
            v = v.ceil();
            precision.get_or_insert(0);
        }
        Some(Rounding::Digits(n)) => {
            let p = 10f64.powi(n);
            v = (v * p).round() / p;
            precision.get_or_insert(n.max(0) as usize);
        }
        None => {}
    }

    if precision.is_none() && fmt.width.is_none() && fmt.digits.is_none() && fmt.grouping.is_none() {
        return text.to_string();
    }

    if v == 0.0 {
        // drop the sign of negative zero
        v = 0.0;
    }

    // digits picks its own precision and ignores width
    let (mut out, width) = if let Some(digits) = fmt.digits {
        let p = adaptive_precision(v, digits);
        (format!("{:.*}", p, v), None)
    } else if let Some(p) = precision {
        (format!("{:.*}", p, v), fmt.width)
    } else {
        (format!("{}", v), fmt.width)
    };

    if let Some(sep) = &fmt.grouping {
        out = group_thousands(&out, sep);
    }

    if let Some(width) = width {
        out = format!("{:>width$}", out, width = width);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> CellFormat {
        CellFormat::default()
    }

    #[test]
    fn test_adaptive_digits_three() {
        let f = CellFormat {
            digits: Some(3),
            ..fmt()
        };
        assert_eq!(format_number("0.5", 0.5, &f), "0.500");
        assert_eq!(format_number("5", 5.0, &f), "5.00");
        assert_eq!(format_number("55", 55.0, &f), "55.0");
        assert_eq!(format_number("555", 555.0, &f), "555");
        assert_eq!(format_number("5555", 5555.0, &f), "5555");
    }

    #[test]
    fn test_digits_ignore_width() {
        let f = CellFormat {
            digits: Some(3),
            width: Some(8),
            ..fmt()
        };
        assert_eq!(format_number("12.345", 12.345, &f), "12.3");
    }

    #[test]
    fn test_adaptive_digits_two_and_four() {
        let two = CellFormat {
            digits: Some(2),
            ..fmt()
        };
        assert_eq!(format_number("0.25", 0.25, &two), "0.25");
        assert_eq!(format_number("2.5", 2.5, &two), "2.5");
        assert_eq!(format_number("25", 25.0, &two), "25");

        let four = CellFormat {
            digits: Some(4),
            ..fmt()
        };
        assert_eq!(format_number("12.5", 12.5, &four), "12.50");
    }

    #[test]
    fn test_rounding() {
        let floor = CellFormat {
            round: Some(Rounding::Floor),
            ..fmt()
        };
        assert_eq!(format_number("3.7", 3.7, &floor), "3");

        let ceil = CellFormat {
            round: Some(Rounding::Ceil),
            ..fmt()
        };
        assert_eq!(format_number("3.2", 3.2, &ceil), "4");

        let round = CellFormat {
            round: Some(Rounding::Digits(1)),
            ..fmt()
        };
        assert_eq!(format_number("3.14159", 3.14159, &round), "3.1");

        let tens = CellFormat {
            round: Some(Rounding::Digits(-1)),
            ..fmt()
        };
        assert_eq!(format_number("1234", 1234.0, &tens), "1230");
    }

    #[test]
    fn test_untouched_without_numeric_format() {
        assert_eq!(format_number("24504.380", 24504.38, &fmt()), "24504.380");
    }

    #[test]
    fn test_grouping_and_width() {
        let group = CellFormat {
            grouping: Some(",".into()),
            ..fmt()
        };
        assert_eq!(format_number("1234567", 1234567.0, &group), "1,234,567");
        assert_eq!(format_number("-1234.5", -1234.5, &group), "-1,234.5");

        let thin = CellFormat {
            grouping: Some("\\,".into()),
            precision: Some(2),
            ..fmt()
        };
        assert_eq!(format_number("24504.38", 24504.38, &thin), "24\\,504.38");

        let width = CellFormat {
            width: Some(6),
            precision: Some(1),
            ..fmt()
        };
        assert_eq!(format_number("2.34", 2.34, &width), "   2.3");
    }

    #[test]
    fn test_group_thousands_short() {
        assert_eq!(group_thousands("123", ","), "123");
        assert_eq!(group_thousands("1234", ","), "1,234");
    }
}
