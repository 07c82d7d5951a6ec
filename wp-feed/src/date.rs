use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const NATIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// The date representations the CMS hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `25/12/2024`, as typed into the event custom field.
    SlashDmy,
    /// `20241225`, the date picker's storage format. A plain JS `Date` parse
    /// rejects this form, so older front ends showed such events as undated.
    CompactYmd,
    /// Anything else, e.g. the `2024-12-25T10:30:00` publish date.
    NativeDateTime,
}

impl DateFormat {
    pub fn detect(raw: &str) -> Self {
        if raw.contains('/') {
            Self::SlashDmy
        } else if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Self::CompactYmd
        } else {
            Self::NativeDateTime
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum NormalizedDate {
    Instant(NaiveDateTime),
    Invalid,
}

impl NormalizedDate {
    pub fn instant(self) -> Option<NaiveDateTime> {
        match self {
            Self::Instant(instant) => Some(instant),
            Self::Invalid => None,
        }
    }

    pub fn date(self) -> Option<NaiveDate> {
        self.instant().map(|instant| instant.date())
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Self::Instant(_))
    }
}

impl From<Option<NaiveDateTime>> for NormalizedDate {
    fn from(instant: Option<NaiveDateTime>) -> Self {
        instant.map_or(Self::Invalid, Self::Instant)
    }
}

/// Turns whatever the CMS stored into a comparable instant.
///
/// Never fails: absent, empty and unparsable input all map to
/// [`NormalizedDate::Invalid`].
pub fn normalize(raw: Option<&str>) -> NormalizedDate {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return NormalizedDate::Invalid;
    };

    let instant = match DateFormat::detect(raw) {
        DateFormat::SlashDmy => parse_slash_dmy(raw),
        DateFormat::CompactYmd => NaiveDate::parse_from_str(raw, "%Y%m%d")
            .ok()
            .map(at_midnight),
        DateFormat::NativeDateTime => parse_native(raw),
    };

    instant.into()
}

fn parse_slash_dmy(raw: &str) -> Option<NaiveDateTime> {
    let mut parts = raw.split('/').map(str::trim);

    let day = parts.next()?;
    let month = parts.next()?;
    let year = parts.next()?;

    if parts.next().is_some() {
        return None;
    }

    // Day-first is ambiguous for generic parsers, so go through year-month-day.
    let reassembled = format!("{year}-{month}-{day}");
    NaiveDate::parse_from_str(&reassembled, "%Y-%m-%d")
        .ok()
        .map(at_midnight)
}

fn parse_native(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.naive_local());
    }

    NATIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(at_midnight)
        })
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
