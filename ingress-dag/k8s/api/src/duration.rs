//! Go-style duration strings (`"250ms"`, `"1m30s"`, `"-5s"`), as used by
//! Kubernetes fields and ingress annotations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, time::Duration};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct K8sDuration {
    duration: Duration,
    is_negative: bool,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("empty duration")]
    Empty,

    #[error("invalid unit {0:?}: {expected}", expected = EXPECTED_UNITS)]
    InvalidUnit(String),

    #[error("missing a unit: {expected}", expected = EXPECTED_UNITS)]
    NoUnit,

    #[error("duration out of range")]
    Overflow,

    #[error("invalid floating-point number: {0}")]
    NotANumber(#[from] std::num::ParseFloatError),
}

const EXPECTED_UNITS: &str = "expected one of 'ns', 'us', '\u{00b5}s', 'ms', 's', 'm', or 'h'";

// === impl K8sDuration ===

impl K8sDuration {
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.is_negative
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.duration.is_zero()
    }

    fn unit(unit: &str) -> Result<Duration, ParseError> {
        let base = match unit {
            "ns" => Duration::from_nanos(1),
            // U+00B5 is the micro sign; U+03BC is the Greek letter mu.
            "us" | "\u{00b5}s" | "\u{03bc}s" => Duration::from_micros(1),
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => Duration::from_secs(60),
            "h" => Duration::from_secs(60 * 60),
            "" => return Err(ParseError::NoUnit),
            unit => return Err(ParseError::InvalidUnit(unit.to_string())),
        };
        Ok(base)
    }
}

impl From<Duration> for K8sDuration {
    fn from(duration: Duration) -> Self {
        Self {
            duration,
            is_negative: false,
        }
    }
}

impl From<K8sDuration> for Duration {
    fn from(K8sDuration { duration, .. }: K8sDuration) -> Self {
        duration
    }
}

impl fmt::Debug for K8sDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for K8sDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative {
            f.write_str("-")?;
        }
        fmt::Debug::fmt(&self.duration, f)
    }
}

impl FromStr for K8sDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (is_negative, mut rest) = if let Some(rest) = s.strip_prefix('-') {
            (true, rest)
        } else {
            (false, s.strip_prefix('+').unwrap_or(s))
        };

        if rest.is_empty() {
            return Err(ParseError::Empty);
        }

        // A bare zero is the only value permitted without a unit.
        if rest == "0" {
            return Ok(Self {
                duration: Duration::ZERO,
                is_negative,
            });
        }

        let is_numeric = |c: char| c.is_ascii_digit() || c == '.';
        let mut duration = Duration::ZERO;
        while !rest.is_empty() {
            let unit_start = rest.find(|c: char| !is_numeric(c)).ok_or(ParseError::NoUnit)?;
            let (value, tail) = rest.split_at(unit_start);
            let unit_end = tail.find(is_numeric).unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);

            let value = value.parse::<f64>()?;
            let part = Duration::try_from_secs_f64(Self::unit(unit)?.as_secs_f64() * value)
                .map_err(|_| ParseError::Overflow)?;
            duration = duration.checked_add(part).ok_or(ParseError::Overflow)?;
            rest = tail;
        }

        Ok(Self {
            duration,
            is_negative,
        })
    }
}

impl Serialize for K8sDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for K8sDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl schemars::JsonSchema for K8sDuration {
    fn schema_name() -> String {
        "K8sDuration".to_owned()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(_: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        // Not `format: duration`, which would imply ISO 8601.
        schemars::schema::SchemaObject {
            instance_type: Some(schemars::schema::InstanceType::String.into()),
            format: None,
            ..Default::default()
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn negative(duration: Duration) -> K8sDuration {
        K8sDuration {
            duration,
            is_negative: true,
        }
    }

    #[test]
    fn parses_go_durations() {
        let cases: &[(&str, K8sDuration)] = &[
            ("0", Duration::ZERO.into()),
            ("+0", Duration::ZERO.into()),
            ("-0", negative(Duration::ZERO)),
            ("30s", Duration::from_secs(30).into()),
            ("+5s", Duration::from_secs(5).into()),
            ("-5s", negative(Duration::from_secs(5))),
            ("1.5s", Duration::from_millis(1500).into()),
            (".5s", Duration::from_millis(500).into()),
            ("5.s", Duration::from_secs(5).into()),
            ("250ms", Duration::from_millis(250).into()),
            ("10ns", Duration::from_nanos(10).into()),
            ("11us", Duration::from_micros(11).into()),
            ("12\u{00b5}s", Duration::from_micros(12).into()),
            ("12\u{03bc}s", Duration::from_micros(12).into()),
            ("15m", (15 * MINUTE).into()),
            ("16h", (16 * 60 * MINUTE).into()),
            ("3h30m", (210 * MINUTE).into()),
            ("1m30s", Duration::from_secs(90).into()),
            (
                "-2m3.5s",
                negative(2 * MINUTE + Duration::from_millis(3500)),
            ),
        ];

        for (input, expected) in cases {
            let parsed = input.parse::<K8sDuration>().unwrap();
            assert_eq!(parsed, *expected, "{input}");
        }
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!("".parse::<K8sDuration>(), Err(ParseError::Empty));
        assert_eq!("-".parse::<K8sDuration>(), Err(ParseError::Empty));
        assert_eq!("30".parse::<K8sDuration>(), Err(ParseError::NoUnit));
        assert_eq!(
            "3d".parse::<K8sDuration>(),
            Err(ParseError::InvalidUnit("d".to_string()))
        );
        assert!(matches!(
            "infinity".parse::<K8sDuration>(),
            Err(ParseError::NotANumber(_))
        ));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            "9999999999999999h".parse::<K8sDuration>(),
            Err(ParseError::Overflow)
        );
        assert_eq!(
            "-9999999999999999h".parse::<K8sDuration>(),
            Err(ParseError::Overflow)
        );
        // Each part fits but the sum does not.
        let half = u64::MAX / 2 + 1;
        assert_eq!(
            format!("{half}s{half}s").parse::<K8sDuration>(),
            Err(ParseError::Overflow)
        );
    }

    #[test]
    fn unit_errors_name_the_expected_units() {
        let err = "3d".parse::<K8sDuration>().unwrap_err();
        assert_eq!(err.to_string(), format!("invalid unit \"d\": {EXPECTED_UNITS}"));
        let err = "30".parse::<K8sDuration>().unwrap_err();
        assert_eq!(err.to_string(), format!("missing a unit: {EXPECTED_UNITS}"));
    }

    #[test]
    fn round_trips_through_serde() {
        let d: K8sDuration = serde_json::from_str("\"1m30s\"").unwrap();
        assert_eq!(Duration::from(d), Duration::from_secs(90));
        let s = serde_json::to_string(&d).unwrap();
        assert_eq!(serde_json::from_str::<K8sDuration>(&s).unwrap(), d);
    }
}
