//! Amount entry: minor-unit parsing of user text and tile labels.

/// Parses a user-typed amount into minor units. At most two fractional digits; zero is unset.
///
/// `"12.50"` and `"12.5"` give 1250, `"$20"` gives 2000, `"1,000"` gives 100000.
pub fn parse_amount(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    let minor = whole.checked_mul(100)?.checked_add(cents)?;
    (minor > 0).then_some(minor)
}

/// `7500` -> `"$75"`, `1250` -> `"$12.50"`. Non-dollar currencies get an uppercase code suffix.
pub fn format_amount(minor: u64, currency: &str) -> String {
    let major = minor / 100;
    let cents = minor % 100;
    let number = if cents == 0 {
        major.to_string()
    } else {
        format!("{}.{:02}", major, cents)
    };
    if currency.eq_ignore_ascii_case("usd") {
        format!("${}", number)
    } else {
        format!("{} {}", number, currency.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_symbol_forms() {
        assert_eq!(parse_amount("12.50"), Some(1250));
        assert_eq!(parse_amount("12.5"), Some(1250));
        assert_eq!(parse_amount("$20"), Some(2000));
        assert_eq!(parse_amount(" 75 "), Some(7500));
        assert_eq!(parse_amount("1,000"), Some(100_000));
        assert_eq!(parse_amount(".75"), Some(75));
    }

    #[test]
    fn zero_empty_and_garbage_are_unset() {
        for text in ["0", "0.00", "", "   ", "$", ".", "abc", "12.345", "-5", "1e3"] {
            assert_eq!(parse_amount(text), None, "{:?}", text);
        }
    }

    #[test]
    fn overflow_is_unset() {
        assert_eq!(parse_amount("99999999999999999999"), None);
    }

    #[test]
    fn formats_tiles() {
        assert_eq!(format_amount(7500, "usd"), "$75");
        assert_eq!(format_amount(1250, "usd"), "$12.50");
        assert_eq!(format_amount(500, "eur"), "5 EUR");
    }
}
