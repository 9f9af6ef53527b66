//! Human-readable duration strings for freshness settings.

use std::time::Duration;

/// Parse a duration such as `"90s"`, `"5m"`, `"1h30m"`, `"2d"` or `"250ms"`.
///
/// A bare number is read as milliseconds. Recognized units are `ms`, `s`,
/// `m`, `h`, `d` and `w`; components are summed.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim().to_lowercase();
    if text.is_empty() {
        return Err("empty duration".into());
    }

    if let Ok(ms) = text.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    let mut total = Duration::ZERO;
    let mut rest = text.as_str();

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("expected a number in {input:?}"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("number out of range in {input:?}"))?;
        rest = rest[digits..].trim_start();

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c.is_whitespace()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = rest[unit_len..].trim_start();

        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(60 * 60)),
            "d" => Duration::from_secs(value.saturating_mul(24 * 60 * 60)),
            "w" => Duration::from_secs(value.saturating_mul(7 * 24 * 60 * 60)),
            "" => return Err(format!("missing unit in {input:?}")),
            other => return Err(format!("unknown unit {other:?} in {input:?}")),
        };
        total = total.saturating_add(part);
    }

    Ok(total)
}
