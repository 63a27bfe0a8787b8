use serde::{Deserialize, Serialize};

/// Severity band derived from a CVSS base score.
///
/// Bands follow the v3 rating scale: a score of exactly zero is `None`,
/// anything above 0.0 up to 3.9 is `Low`, and so on up to `Critical` at
/// 9.0 and above.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl From<f64> for Severity {
    fn from(value: f64) -> Self {
        if value >= 9.0 {
            Self::Critical
        } else if value >= 7.0 {
            Self::High
        } else if value >= 4.0 {
            Self::Medium
        } else if value > 0.0 {
            Self::Low
        } else {
            Self::None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Severity::None)]
    #[case(0.1, Severity::Low)]
    #[case(3.9, Severity::Low)]
    #[case(4.0, Severity::Medium)]
    #[case(6.9, Severity::Medium)]
    #[case(7.0, Severity::High)]
    #[case(8.9, Severity::High)]
    #[case(9.0, Severity::Critical)]
    #[case(10.0, Severity::Critical)]
    fn banding(#[case] value: f64, #[case] expected: Severity) {
        assert_eq!(Severity::from(value), expected);
    }

    #[test]
    fn bands_are_ordered() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low > Severity::None);
    }

    #[test]
    fn lowercase_wire_format() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).expect("must serialize"),
            r#""critical""#
        );
        assert_eq!(Severity::Medium.to_string(), "medium");
    }
}
