pub type Micros = i64;

pub const MICROS_PER_UNIT: Micros = 1_000_000;

pub const CURRENCY_CODE: &str = "INR";

/// Converts a floating currency amount to micro-units, truncating toward zero.
pub fn to_micros(value: f64) -> Micros {
    (value * MICROS_PER_UNIT as f64) as Micros
}

pub fn from_micros(value: Micros) -> f64 {
    value as f64 / MICROS_PER_UNIT as f64
}

pub fn units_to_micros(units: i64) -> Option<Micros> {
    units.checked_mul(MICROS_PER_UNIT)
}

/// Renders micro-units with lakh/crore digit grouping and two decimals,
/// e.g. `INR 10,00,00,000.00`. Sub-paise digits are truncated.
pub fn format_grouped(value: Micros) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    let scale = MICROS_PER_UNIT.unsigned_abs();
    let whole = magnitude / scale;
    let paise = (magnitude % scale) / (scale / 100);

    format!(
        "{sign}{CURRENCY_CODE} {}.{paise:02}",
        group_indian(&whole.to_string())
    )
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::{format_grouped, from_micros, to_micros, units_to_micros};

    #[test]
    fn conversion_truncates_toward_zero() {
        assert_eq!(to_micros(22_500.0), 22_500_000_000);
        assert_eq!(to_micros(0.01), 10_000);
        assert_eq!(to_micros(1.234_567_9), 1_234_567);
        assert_eq!(to_micros(-1.234_567_9), -1_234_567);
        assert_eq!(from_micros(2_900_000_000), 2_900.0);
    }

    #[test]
    fn whole_units_overflow_is_reported() {
        assert_eq!(units_to_micros(100_000_000), Some(100_000_000_000_000));
        assert_eq!(units_to_micros(i64::MAX), None);
    }

    #[test]
    fn grouped_format_uses_lakh_and_crore_separators() {
        assert_eq!(format_grouped(to_micros(100_000_000.0)), "INR 10,00,00,000.00");
        assert_eq!(format_grouped(to_micros(3_750_000.5)), "INR 37,50,000.50");
        assert_eq!(format_grouped(to_micros(999.0)), "INR 999.00");
        assert_eq!(format_grouped(to_micros(1_000.0)), "INR 1,000.00");
        assert_eq!(format_grouped(-to_micros(12_345.67)), "-INR 12,345.67");
        assert_eq!(format_grouped(0), "INR 0.00");
    }
}
