use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone};
use crate::utilities::config;

/// Read-only view of the user's language and clock, used for ETA strings.
pub trait LocaleResolver: Send + Sync {
    fn language(&self) -> String;
    fn utc_offset(&self) -> FixedOffset;
}

#[derive(Debug, Clone)]
pub struct StaticLocale {
    language: String,
    offset: FixedOffset,
}

impl StaticLocale {
    pub fn new(language: impl Into<String>, offset: FixedOffset) -> Self {
        Self { language: language.into(), offset }
    }

    pub fn utc(language: impl Into<String>) -> Self {
        Self::new(language, chrono::Utc.fix())
    }
}

impl LocaleResolver for StaticLocale {
    fn language(&self) -> String {
        self.language.clone()
    }

    fn utc_offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Language from `APP_LOCALE`, offset from the host time zone.
#[derive(Debug, Clone, Default)]
pub struct SystemLocale;

impl LocaleResolver for SystemLocale {
    fn language(&self) -> String {
        config::get_locale()
    }

    fn utc_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

fn parse_timestamp(raw: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(offset));
    }

    // No zone designator: read it as wall-clock time in the user's offset
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}

/// Short clock time for `raw`, or `raw` itself when it is not a timestamp.
pub fn format_short_time(raw: &str, locale: &dyn LocaleResolver) -> String {
    let offset = locale.utc_offset();
    match parse_timestamp(raw, &offset) {
        Some(at) if locale.language().to_lowercase().starts_with("en") => at.format("%I:%M %p").to_string(),
        Some(at) => at.format("%H:%M").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_english_uses_twelve_hour_clock() {
        let locale = StaticLocale::new("en", ist());
        assert_eq!(format_short_time("2025-01-10T09:30:00+00:00", &locale), "03:00 PM");
    }

    #[test]
    fn test_other_languages_use_twenty_four_hour_clock() {
        let locale = StaticLocale::new("hi", ist());
        assert_eq!(format_short_time("2025-01-10T09:30:00.123456+00:00", &locale), "15:00");
    }

    #[test]
    fn test_naive_timestamp_is_local_wall_clock() {
        let locale = StaticLocale::new("gu", ist());
        assert_eq!(format_short_time("2025-01-10T07:05:00", &locale), "07:05");
    }

    #[test]
    fn test_unparseable_passes_through() {
        let locale = StaticLocale::utc("en");
        assert_eq!(format_short_time("soon-ish", &locale), "soon-ish");
        assert_eq!(format_short_time("", &locale), "");
    }
}
