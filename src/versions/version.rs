use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{DocSamplesError, Result};

/// A dotted numeric version such as `7.2.4`.
///
/// Comparison is component-wise and numeric, left to right, with missing
/// trailing components treated as zero, so `7.2 == 7.2.0` and `7.10 > 7.9`.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
    raw: String,
}

impl Version {
    /// Parse a version, ignoring a leading `v` and any suffix after the
    /// digits of a component (`7.2.0-rc1` parses as `7.2.0`).
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        if body.is_empty() {
            return Err(DocSamplesError::InvalidVersion(input.to_string()));
        }

        let mut components = Vec::new();
        for part in body.split('.') {
            let digits: &str = &part[..part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len())];
            if digits.is_empty() {
                return Err(DocSamplesError::InvalidVersion(input.to_string()));
            }
            let value = digits
                .parse::<u64>()
                .map_err(|_| DocSamplesError::InvalidVersion(input.to_string()))?;
            components.push(value);
            if digits.len() != part.len() {
                // Pre-release or build suffix ends the numeric part
                break;
            }
        }

        Ok(Self {
            components,
            raw: body.to_string(),
        })
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, idx: usize) -> u64 {
        self.components.get(idx).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = DocSamplesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("7.2"), v("7.2.0"));
        assert_eq!(v("7"), v("7.0.0"));
        assert!(v("7.2.1") > v("7.2"));
    }

    #[test]
    fn test_numeric_not_lexical() {
        assert!(v("7.10") > v("7.9"));
        assert!(v("10.0") > v("9.99.99"));
    }

    #[test]
    fn test_leading_v_is_stripped() {
        assert_eq!(v("v8.0.1").components(), &[8, 0, 1]);
        assert!(v("v8.0.1") > v("7.4"));
        assert_eq!(v("V1.2").to_string(), "1.2");
    }

    #[test]
    fn test_suffix_ends_numeric_part() {
        assert_eq!(v("7.2.0-rc1").components(), &[7, 2, 0]);
        assert_eq!(v("8.0-m02").components(), &[8, 0]);
    }

    #[test]
    fn test_invalid_versions() {
        for input in ["", "v", "latest", "7..1", ".5", "x.1"] {
            assert!(
                matches!(Version::parse(input), Err(DocSamplesError::InvalidVersion(_))),
                "{:?} should be invalid",
                input
            );
        }
    }

    #[test]
    fn test_max_of_versions() {
        let versions = ["6.2", "7.0.12", "7.0.2", "5.0"].map(v);
        assert_eq!(versions.iter().max().unwrap().to_string(), "7.0.12");
    }
}
