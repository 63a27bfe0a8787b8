use time::{
    Date, OffsetDateTime,
    format_description::well_known::{Rfc2822, Rfc3339},
    macros::format_description,
};

/// Parse a timestamp as RFC 3339, falling back to a bare `YYYY-MM-DD`
/// date taken as midnight UTC.
pub fn parse_timestamp(input: &str) -> Result<OffsetDateTime, time::error::Parse> {
    if let Ok(parsed) = OffsetDateTime::parse(input, &Rfc3339) {
        return Ok(parsed);
    }

    Date::parse(input, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
}

/// Parse an RFC 2822 feed timestamp, e.g. `Tue, 02 Jul 2024 14:00:00 +0000`.
pub fn parse_feed_timestamp(input: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(input.trim(), &Rfc2822)
}
