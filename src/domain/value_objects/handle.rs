use serde::{Deserialize, Serialize};
use std::fmt;

/// URL-safe slug identifying a flow within a deployment and flow type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(pub String);

pub const HANDLE_PATTERN: &str = r"^[a-z0-9]([a-z0-9_-]*[a-z0-9])?$";

impl Handle {
    pub fn new(handle: String) -> Result<Self, String> {
        if handle.trim().is_empty() {
            return Err("Flow handle cannot be empty".to_string());
        }
        if !Self::matches_format(&handle) {
            return Err(format!("Flow handle '{}' has an invalid format", handle));
        }
        Ok(Handle(handle))
    }

    pub fn matches_format(handle: &str) -> bool {
        regex::Regex::new(HANDLE_PATTERN)
            .map(|pattern| pattern.is_match(handle))
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_handles() {
        for handle in ["basic-auth", "a", "a1", "login_v2", "0flow", "x-y_z9"] {
            assert!(Handle::new(handle.to_string()).is_ok(), "{}", handle);
        }
    }

    #[test]
    fn test_invalid_handles() {
        for handle in ["", "-auth", "auth-", "_auth", "Auth", "my flow", "a..b", "é"] {
            assert!(Handle::new(handle.to_string()).is_err(), "{:?}", handle);
        }
    }

    #[test]
    fn test_single_char_edge() {
        assert!(Handle::matches_format("a"));
        assert!(!Handle::matches_format("-"));
    }
}
