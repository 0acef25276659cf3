//! Display formatting for investment cards

use crate::constants::DEFAULT_COUNTRY_CODE;

/// Format an amount into a short dollar string ($0, $950, $25.0K, $1.5M)
pub fn format_amount(value: Option<f64>) -> String {
    const K: f64 = 1_000.0;
    const M: f64 = K * 1_000.0;
    let num = match value {
        Some(n) if n.is_finite() && n != 0.0 => n,
        _ => return "$0".to_string(),
    };
    if num >= M {
        format!("${:.1}M", num / M)
    } else if num >= K {
        format!("${:.1}K", num / K)
    } else {
        format!("${}", plain_number(num))
    }
}

/// Up to three fraction digits, trailing zeros dropped
fn plain_number(num: f64) -> String {
    let fixed = format!("{:.3}", num);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cut `text` to `max_chars` characters, appending "..." when anything was dropped
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim())
}

/// Escape text for both element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Lower-cased ISO code for the flag image
pub fn country_code(country: Option<&str>) -> String {
    match country.map(str::trim) {
        Some(code) if !code.is_empty() => code.to_ascii_lowercase(),
        _ => DEFAULT_COUNTRY_CODE.to_string(),
    }
}
