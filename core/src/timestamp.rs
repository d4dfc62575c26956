use chrono::{DateTime, NaiveDateTime, Utc};

const MAX_FRACTION_DIGITS: usize = 6;

/// Parses the network server's publish time.
///
/// Providers send anything from zero to nine fractional digits, they are
/// cut to microseconds first. Returns `None` for anything unparseable, the
/// caller decides on the fallback.
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = truncate_fraction(raw.trim());
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(parsed.with_timezone(&Utc));
    }

    // offset-less timestamps are taken as UTC
    let naive = normalized.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|parsed| parsed.and_utc())
}

fn truncate_fraction(raw: &str) -> String {
    let Some(dot) = raw.find('.') else {
        return raw.to_owned();
    };
    let (head, tail) = raw.split_at(dot + 1);
    let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
    if digits <= MAX_FRACTION_DIGITS {
        return raw.to_owned();
    }
    format!("{}{}{}", head, &tail[..MAX_FRACTION_DIGITS], &tail[digits..])
}
