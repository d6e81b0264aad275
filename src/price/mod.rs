//! Price text normalization

/// Extract an integer currency amount from freeform text.
///
/// Every non-digit character is dropped and the remaining digits are read as
/// one number, so `"1,234원"` becomes `1234`. Text without digits, or digits
/// that overflow `u64`, yield `0`.
pub fn parse_price(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_won() {
        assert_eq!(parse_price("1,234,000원"), 1_234_000);
        assert_eq!(parse_price("1,234원"), 1234);
        assert_eq!(parse_price("  89,000 "), 89_000);
    }

    #[test]
    fn test_parse_price_without_digits() {
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("무료"), 0);
        assert_eq!(parse_price("Price not found"), 0);
    }

    #[test]
    fn test_parse_price_concatenates_all_digits() {
        // No decimal-point semantics: fractions are folded into the amount.
        assert_eq!(parse_price("12.50"), 1250);
        assert_eq!(parse_price("10% 할인 9,900원"), 109_900);
    }

    #[test]
    fn test_parse_price_overflow() {
        assert_eq!(parse_price("99999999999999999999999"), 0);
    }
}
