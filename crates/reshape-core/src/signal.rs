use std::fmt;

use serde::{Deserialize, Serialize};

/// A named value slot.
///
/// Signals carry no value themselves: a match template writes into the slot
/// named by `key` and a format template reads from it. Two signals with the
/// same key are the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signal {
    key: String,
}

impl Signal {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S({})", self.key)
    }
}

/// Shorthand for [`Signal::new`].
#[allow(non_snake_case)]
pub fn S(key: impl Into<String>) -> Signal {
    Signal::new(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_identity_is_key() {
        assert_eq!(S("first_name"), Signal::new("first_name".to_string()));
        assert_ne!(S("first_name"), S("last_name"));
        assert_eq!(S("zip").to_string(), "S(zip)");
    }
}
