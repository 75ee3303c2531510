use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order of day and month in rendered dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateFormat {
    /// MM/DD/YYYY
    Us,
    /// DD/MM/YYYY
    #[default]
    Au,
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" | "mm/dd/yyyy" => Ok(DateFormat::Us),
            "au" | "dd/mm/yyyy" => Ok(DateFormat::Au),
            other => Err(format!("unknown date format '{other}' (expected 'us' or 'au')")),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::Us => write!(f, "US"),
            DateFormat::Au => write!(f, "AU"),
        }
    }
}

/// Format an ISO date (`2024-01-15` or a full RFC 3339 timestamp).
///
/// Input that is not a recognisable date is returned unchanged.
pub fn format_date(raw: &str, format: DateFormat) -> String {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            trimmed
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        });

    match date {
        Some(d) => match format {
            DateFormat::Us => d.format("%m/%d/%Y").to_string(),
            DateFormat::Au => d.format("%d/%m/%Y").to_string(),
        },
        None => trimmed.to_string(),
    }
}

/// Symbol and minor-unit digits for a currency code.
fn currency_style(code: &str) -> (Option<&'static str>, u32) {
    match code {
        "USD" => (Some("$"), 2),
        "EUR" => (Some("€"), 2),
        "GBP" => (Some("£"), 2),
        "AUD" => (Some("A$"), 2),
        "CAD" => (Some("CA$"), 2),
        "NZD" => (Some("NZ$"), 2),
        "HKD" => (Some("HK$"), 2),
        "MXN" => (Some("MX$"), 2),
        "BRL" => (Some("R$"), 2),
        "INR" => (Some("₹"), 2),
        "CNY" => (Some("CN¥"), 2),
        "ILS" => (Some("₪"), 2),
        "JPY" => (Some("¥"), 0),
        "KRW" => (Some("₩"), 0),
        "VND" => (Some("₫"), 0),
        "CLP" | "ISK" | "HUF" => (None, 0),
        _ => (None, 2),
    }
}

/// Format an amount in the given ISO 4217 currency, e.g. `$1,234.50`.
///
/// Rounds half away from zero to the currency's minor unit.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let (symbol, digits) = currency_style(&code);
    let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let number = group_thousands(&format!("{:.*}", digits as usize, rounded.abs()));

    match symbol {
        Some(symbol) => format!("{sign}{symbol}{number}"),
        None => format!("{sign}{code} {number}"),
    }
}

/// Fractional rate as a percentage with one decimal: `0.1` -> `10.0%`.
pub fn format_percent(rate: Decimal) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.1}%")
}

/// Quantities print without trailing zeros: `2.00` -> `2`, `1.50` -> `1.5`.
pub fn format_quantity(qty: Decimal) -> String {
    qty.normalize().to_string()
}

fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Escape user-controlled text for HTML element content and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape multi-line text, turning newlines into `<br>`.
pub fn escape_multiline(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| escape_html(line.trim_end()))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Strip characters that could end a CSS declaration or the style element.
pub fn css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | ';' | '\\' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Percent-encode characters that would break out of a CSS `url('...')`.
pub fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.trim().chars() {
        match ch {
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '\\' => out.push_str("%5C"),
            c if c.is_whitespace() => out.push_str("%20"),
            c => out.push(c),
        }
    }
    out
}

/// Millimetre and point values, trimmed to at most three decimals.
pub fn num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}
