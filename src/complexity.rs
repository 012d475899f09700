//! Recognized complexity classes and their growth functions
//!
//! The set is closed: claims naming anything else are rejected at load time,
//! and the fitter only ever considers these candidates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Symbolic asymptotic growth class.
///
/// Variants are declared from asymptotically smallest to largest, so the
/// derived `Ord` doubles as the "smaller class wins" tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComplexityClass {
    /// `O(1)`
    Constant,
    /// `O(log n)`
    Logarithmic,
    /// `O(n)`
    Linear,
    /// `O(n log n)`
    Linearithmic,
    /// `O(n^2)`
    Quadratic,
    /// `O(n^3)`
    Cubic,
    /// `O(2^n)`
    Exponential,
}

impl ComplexityClass {
    /// Every recognized class, smallest first.
    pub const ALL: [Self; 7] = [
        Self::Constant,
        Self::Logarithmic,
        Self::Linear,
        Self::Linearithmic,
        Self::Quadratic,
        Self::Cubic,
        Self::Exponential,
    ];

    /// Canonical symbol, e.g. `O(n log n)`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Constant => "O(1)",
            Self::Logarithmic => "O(log n)",
            Self::Linear => "O(n)",
            Self::Linearithmic => "O(n log n)",
            Self::Quadratic => "O(n^2)",
            Self::Cubic => "O(n^3)",
            Self::Exponential => "O(2^n)",
        }
    }

    /// Natural log of the growth function at `n`.
    ///
    /// Working in log space keeps `O(2^n)` representable for any input size.
    /// Inner logarithms are floored at 1 so `O(log n)` and `O(n log n)` stay
    /// positive for tiny inputs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn log_growth(self, n: usize) -> f64 {
        let x = n.max(1) as f64;
        let ln_n = x.ln();
        let ln_ln_n = ln_n.max(1.0).ln();
        match self {
            Self::Constant => 0.0,
            Self::Logarithmic => ln_ln_n,
            Self::Linear => ln_n,
            Self::Linearithmic => ln_n + ln_ln_n,
            Self::Quadratic => 2.0 * ln_n,
            Self::Cubic => 3.0 * ln_n,
            Self::Exponential => x * std::f64::consts::LN_2,
        }
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Symbol outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClass(pub String);

impl fmt::Display for UnknownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized complexity class {:?}", self.0)
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for ComplexityClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "o(1)" => Ok(Self::Constant),
            "o(logn)" => Ok(Self::Logarithmic),
            "o(n)" => Ok(Self::Linear),
            "o(nlogn)" | "o(n*logn)" => Ok(Self::Linearithmic),
            "o(n^2)" | "o(n²)" => Ok(Self::Quadratic),
            "o(n^3)" | "o(n³)" => Ok(Self::Cubic),
            "o(2^n)" => Ok(Self::Exponential),
            _ => Err(UnknownClass(s.to_string())),
        }
    }
}

impl Serialize for ComplexityClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for ComplexityClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        symbol.parse().map_err(serde::de::Error::custom)
    }
}
