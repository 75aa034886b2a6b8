//! Presentation formatting shared by the meter and widgets.
//!
//! Donation totals are never negative, so every money formatter clamps below
//! at zero before rendering. Percent values pass through `clamp_percent` so a
//! bad goal can never leak NaN or infinity into the display.

/// Clamps a percent into `[0, 100]`; non-finite input becomes 0.
pub fn clamp_percent(p: f64) -> f64 {
    if !p.is_finite() {
        return 0.0;
    }
    p.clamp(0.0, 100.0)
}

/// One-decimal percent display, e.g. `25.0%`.
pub fn format_percent(p: f64) -> String {
    format!("{:.1}%", clamp_percent(p))
}

/// Full currency display with grouped thousands and no decimals, e.g. `$12,345`.
pub fn format_currency(amount: f64, symbol: &str, locale: &str) -> String {
    let units = to_units(amount);
    format!("{}{}", symbol, group_thousands(units, separator_for(locale)))
}

/// Compact currency display, e.g. `$12.3K` or `$1.2M`; a trailing `.0` is
/// dropped so round values read as `$12K`.
pub fn format_currency_compact(amount: f64, symbol: &str) -> String {
    let units = to_units(amount) as f64;
    let (scaled, suffix) = if units >= 1_000_000_000.0 {
        (units / 1_000_000_000.0, "B")
    } else if units >= 1_000_000.0 {
        (units / 1_000_000.0, "M")
    } else if units >= 1_000.0 {
        (units / 1_000.0, "K")
    } else {
        return format!("{}{}", symbol, units as u64);
    };
    let mut body = format!("{:.1}", scaled);
    if body.ends_with(".0") {
        body.truncate(body.len() - 2);
    }
    format!("{}{}{}", symbol, body, suffix)
}

/// Currency symbol for an ISO code; unknown codes fall back to the code with
/// a trailing space so amounts stay readable.
pub fn currency_symbol(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{} ", other),
    }
}

fn to_units(amount: f64) -> u64 {
    if !amount.is_finite() {
        return 0;
    }
    amount.max(0.0).round() as u64
}

fn separator_for(locale: &str) -> char {
    // Coarse grouping rule: continental-European locales group with a dot,
    // French with a narrow space, everything else with a comma.
    let lang = locale.split(['-', '_']).next().unwrap_or("en");
    match lang {
        "de" | "es" | "it" | "pt" | "nl" => '.',
        "fr" => '\u{202f}',
        _ => ',',
    }
}

fn group_thousands(n: u64, sep: char) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_percent_bounds() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(0.0), 0.0);
        assert_eq!(clamp_percent(42.5), 42.5);
        assert_eq!(clamp_percent(150.0), 100.0);
    }

    #[test]
    fn test_clamp_percent_non_finite() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 0.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_format_percent_one_decimal() {
        assert_eq!(format_percent(25.0), "25.0%");
        assert_eq!(format_percent(33.333), "33.3%");
        assert_eq!(format_percent(100.0), "100.0%");
    }

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(0.0, "$", "en-US"), "$0");
        assert_eq!(format_currency(950.0, "$", "en-US"), "$950");
        assert_eq!(format_currency(12_345.0, "$", "en-US"), "$12,345");
        assert_eq!(format_currency(1_234_567.0, "$", "en-US"), "$1,234,567");
    }

    #[test]
    fn test_format_currency_clamps_negative() {
        assert_eq!(format_currency(-250.0, "$", "en-US"), "$0");
    }

    #[test]
    fn test_format_currency_rounds() {
        assert_eq!(format_currency(2499.6, "$", "en-US"), "$2,500");
    }

    #[test]
    fn test_format_currency_locale_separator() {
        assert_eq!(format_currency(12_345.0, "€", "de-DE"), "€12.345");
    }

    #[test]
    fn test_format_currency_compact() {
        assert_eq!(format_currency_compact(950.0, "$"), "$950");
        assert_eq!(format_currency_compact(12_300.0, "$"), "$12.3K");
        assert_eq!(format_currency_compact(12_000.0, "$"), "$12K");
        assert_eq!(format_currency_compact(1_200_000.0, "$"), "$1.2M");
        assert_eq!(format_currency_compact(2_500_000_000.0, "$"), "$2.5B");
    }

    #[test]
    fn test_currency_symbol_known_and_fallback() {
        assert_eq!(currency_symbol("usd"), "$");
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("SEK"), "SEK ");
    }
}
