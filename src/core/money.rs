use rust_decimal::Decimal;

/// Amounts are stored as integer minor units (two decimal places)
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Convert an integer minor-unit amount into a major-unit decimal
pub fn to_major_units(amount: i64) -> Decimal {
    Decimal::new(amount, MINOR_UNIT_SCALE)
}

/// Render a minor-unit amount as `{symbol}{major with thousands separators}.{cents}`
///
/// `format_minor_units(-123456789, "$")` gives `-$1,234,567.89`.
pub fn format_minor_units(amount: i64, symbol: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let major = abs / 100;
    let minor = abs % 100;

    let digits = major.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{:02}", sign, symbol, grouped, minor)
}

/// Format a percentage with one decimal place
pub fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp(1))
}
