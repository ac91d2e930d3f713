use std::fmt::{Display, Formatter};

/// States the host registry uses to mark an entity that has no usable value.
const UNAVAILABLE_MARKERS: [&str; 2] = ["unknown", "unavailable"];

/// A single reading of a source, taken fresh on every refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampledValue {
    /// The source does not exist in the registry.
    Missing,
    /// The source exists but its state is a marker or is not a finite number.
    Invalid,
    Present(f64),
}

impl SampledValue {
    /// Interprets a raw registry state, `None` meaning the entity is absent.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let raw = match raw {
            None => return SampledValue::Missing,
            Some(raw) => raw.trim(),
        };

        if UNAVAILABLE_MARKERS.iter().any(|marker| raw.eq_ignore_ascii_case(marker)) {
            return SampledValue::Invalid;
        }

        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => SampledValue::Present(value),
            _ => SampledValue::Invalid,
        }
    }

    /// Zero-fallback: anything other than a present reading counts as zero.
    pub fn or_zero(&self) -> f64 {
        match self {
            SampledValue::Present(value) => *value,
            SampledValue::Missing | SampledValue::Invalid => 0.0,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, SampledValue::Present(_))
    }
}

impl Display for SampledValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SampledValue::Missing => write!(f, "missing"),
            SampledValue::Invalid => write!(f, "invalid"),
            SampledValue::Present(value) => write!(f, "{}", value),
        }
    }
}
