use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::LazyLock};

static ADVISORY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CERTFR-\d{4}-(AVI|ALE|CTI|IOC|DUR)-\d{3,4}$").expect("hard-coded pattern")
});

static VULNERABILITY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^CVE-\d{4}-\d{4,7}$").expect("hard-coded pattern"));

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid advisory identifier: {0}")]
    InvalidAdvisoryId(String),
    #[error("invalid vulnerability identifier: {0}")]
    InvalidVulnerabilityId(String),
}

/// The publication series an advisory identifier belongs to.
///
/// The series token is the third segment of the identifier and also
/// selects the URL path segment of the published page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum AdvisoryKind {
    /// Security advisories (`AVI`)
    Advisory,
    /// Active exploitation alerts (`ALE`)
    Alert,
    /// Threat intelligence reports (`CTI`)
    ThreatIntel,
    /// Indicators of compromise (`IOC`)
    Indicators,
    /// Hardening guides (`DUR`)
    Hardening,
}

impl AdvisoryKind {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Advisory => "AVI",
            Self::Alert => "ALE",
            Self::ThreatIntel => "CTI",
            Self::Indicators => "IOC",
            Self::Hardening => "DUR",
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Advisory => "avis",
            Self::Alert => "alerte",
            Self::ThreatIntel => "cti",
            Self::Indicators => "ioc",
            Self::Hardening => "dur",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "AVI" => Some(Self::Advisory),
            "ALE" => Some(Self::Alert),
            "CTI" => Some(Self::ThreatIntel),
            "IOC" => Some(Self::Indicators),
            "DUR" => Some(Self::Hardening),
            _ => None,
        }
    }
}

/// A CERT advisory reference, e.g. `CERTFR-2024-AVI-0123`.
///
/// Input is accepted case-insensitively and normalized to upper case, so
/// equal references compare equal regardless of how the source spelled
/// them.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdvisoryId {
    value: String,
    kind: AdvisoryKind,
}

impl AdvisoryId {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> AdvisoryKind {
        self.kind
    }
}

impl FromStr for AdvisoryId {
    type Err = IdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if !ADVISORY_ID.is_match(input) {
            return Err(IdError::InvalidAdvisoryId(input.into()));
        }

        let value = input.to_uppercase();
        let token = value.split('-').nth(2).and_then(AdvisoryKind::from_token);

        match token {
            Some(kind) => Ok(Self { value, kind }),
            None => Err(IdError::InvalidAdvisoryId(input.into())),
        }
    }
}

impl TryFrom<String> for AdvisoryId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AdvisoryId> for String {
    fn from(id: AdvisoryId) -> Self {
        id.value
    }
}

impl fmt::Display for AdvisoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A vulnerability identifier, e.g. `CVE-2024-28834`.
///
/// Normalized to upper case; the derived ordering is the plain
/// lexicographic order of the normalized form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VulnerabilityId(String);

impl VulnerabilityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VulnerabilityId {
    type Err = IdError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if !VULNERABILITY_ID.is_match(input) {
            return Err(IdError::InvalidVulnerabilityId(input.into()));
        }

        Ok(Self(input.to_uppercase()))
    }
}

impl TryFrom<String> for VulnerabilityId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VulnerabilityId> for String {
    fn from(id: VulnerabilityId) -> Self {
        id.0
    }
}

impl fmt::Display for VulnerabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
