use crate::date::parse_timestamp;
use std::{collections::BTreeSet, time::Duration};
use time::OffsetDateTime;

/// Invalid run configuration. Always fatal, and always surfaced before
/// the first fetch.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("date-from ({from}) is after date-to ({to})")]
    InvertedDateRange {
        from: OffsetDateTime,
        to: OffsetDateTime,
    },
    #[error("history depth must be at least 1")]
    ZeroHistoryDepth,
}

/// Advisory filter criteria.
///
/// Both criteria combine as a logical AND; an empty keyword list means no
/// keyword filtering at all.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct FilterConfig {
    /// Keep only advisories whose title keywords contain this token (repeatable)
    #[arg(long = "keyword", value_name = "TOKEN")]
    pub keywords: Vec<String>,

    /// Inclusive lower bound on the publication date (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub date_from: Option<OffsetDateTime>,

    /// Inclusive upper bound on the publication date (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub date_to: Option<OffsetDateTime>,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(ConfigError::InvertedDateRange { from, to });
        }

        Ok(())
    }

    /// Keyword tokens lowered for comparison against advisory keywords.
    pub fn normalized_keywords(&self) -> BTreeSet<String> {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect()
    }
}

/// KPI history retention settings.
#[derive(clap::Args, Clone, Debug)]
pub struct HistoryConfig {
    /// Minimum separation between retained snapshots, e.g. `1day 12h`
    #[arg(long = "history-gap", value_parser = humantime::parse_duration)]
    pub gap: Option<Duration>,

    /// Maximum number of retained snapshots
    #[arg(long = "history-depth", default_value_t = 52)]
    pub depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            gap: None,
            depth: 52,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::ZeroHistoryDepth);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn inverted_date_range_is_rejected() {
        let config = FilterConfig {
            date_from: Some(datetime!(2024-07-02 00:00:00 UTC)),
            date_to: Some(datetime!(2024-01-01 00:00:00 UTC)),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn equal_bounds_are_valid() {
        let date = datetime!(2024-07-02 00:00:00 UTC);
        let config = FilterConfig {
            date_from: Some(date),
            date_to: Some(date),
            ..Default::default()
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn keywords_are_normalized() {
        let config = FilterConfig {
            keywords: vec!["OpenSSL".into(), "  kernel ".into(), "".into()],
            ..Default::default()
        };

        let normalized = config.normalized_keywords();
        assert_eq!(
            normalized.into_iter().collect::<Vec<_>>(),
            vec!["kernel".to_string(), "openssl".to_string()]
        );
    }

    #[test]
    fn zero_history_depth_is_rejected() {
        let config = HistoryConfig {
            depth: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroHistoryDepth)
        ));
    }
}
