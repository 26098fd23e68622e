//! Claim requirements.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::principal::Principal;

/// A required claim: the principal must carry a claim of `claim_type` whose
/// value is one of `values`.
///
/// An empty value set accepts any claim of the given type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type (e.g. `"dept"`).
    #[serde(rename = "type")]
    pub claim_type: String,

    /// Accepted values.
    #[serde(default)]
    pub values: BTreeSet<String>,
}

impl Claim {
    /// Creates a claim requirement accepting any of `values`.
    pub fn new<I, S>(claim_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claim_type: claim_type.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a claim requirement satisfied by any value of `claim_type`.
    pub fn any_value(claim_type: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            values: BTreeSet::new(),
        }
    }

    /// Returns whether the principal carries this claim.
    pub fn is_satisfied_by<P: Principal + ?Sized>(&self, principal: &P) -> bool {
        if self.values.is_empty() {
            return principal.has_claim_type(&self.claim_type);
        }

        self.values
            .iter()
            .any(|value| principal.has_claim(&self.claim_type, value))
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "{}=*", self.claim_type);
        }

        let values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        write!(f, "{}={}", self.claim_type, values.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Identity;

    #[test]
    fn test_any_listed_value_satisfies() {
        let claim = Claim::new("dept", ["eng", "ops"]);

        assert!(claim.is_satisfied_by(&Identity::authenticated("a").with_claim("dept", "ops")));
        assert!(!claim.is_satisfied_by(&Identity::authenticated("a").with_claim("dept", "sales")));
        assert!(!claim.is_satisfied_by(&Identity::authenticated("a")));
    }

    #[test]
    fn test_empty_values_require_only_the_type() {
        let claim = Claim::any_value("badge");

        assert!(claim.is_satisfied_by(&Identity::authenticated("a").with_claim("badge", "42")));
        assert!(!claim.is_satisfied_by(&Identity::authenticated("a").with_claim("dept", "eng")));
    }

    #[test]
    fn test_display() {
        assert_eq!(Claim::new("dept", ["ops", "eng"]).to_string(), "dept=eng|ops");
        assert_eq!(Claim::any_value("badge").to_string(), "badge=*");
    }

    #[test]
    fn test_deserialize_uses_type_key() {
        let claim: Claim = serde_json::from_str(r#"{"type":"dept","values":["eng"]}"#).unwrap();
        assert_eq!(claim, Claim::new("dept", ["eng"]));

        let bare: Claim = serde_json::from_str(r#"{"type":"badge"}"#).unwrap();
        assert_eq!(bare, Claim::any_value("badge"));
    }
}
