//! Display formatting shared by every surface

/// Group the integer part of a decimal string with commas
fn group_thousands(integer: &str) -> String {
    let bytes = integer.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn split_fixed(value: f64, decimals: usize) -> (bool, String, String) {
    let fixed = format!("{:.*}", decimals, value.abs());
    let negative = value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.');
    match fixed.split_once('.') {
        Some((int, frac)) => (negative, int.to_string(), frac.to_string()),
        None => (negative, fixed, String::new()),
    }
}

/// `1234.5` → `$1,234.50`, `-3.2` → `-$3.20`
pub fn format_currency(amount: f64) -> String {
    let (negative, int, frac) = split_fixed(amount, 2);
    format!("{}${}.{}", if negative { "-" } else { "" }, group_thousands(&int), frac)
}

/// Ratio to percent with two decimals: `0.89` → `89.00%`
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Grouped number with at most two decimals and no trailing zeros
pub fn format_number(value: f64) -> String {
    let (negative, int, frac) = split_fixed(value, 2);
    let frac = frac.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{}", group_thousands(&int))
    } else {
        format!("{sign}{}.{frac}", group_thousands(&int))
    }
}

/// `0x1234567890abcdef` → `0x1234...cdef`; short addresses are unchanged
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        address.to_string()
    }
}

/// Native balance with four decimals and the chain symbol
pub fn format_balance(balance: f64, symbol: &str) -> String {
    format!("{balance:.4} {symbol}")
}
