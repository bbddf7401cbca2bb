use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Authentication,
    Registration,
}

impl FlowType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "authentication" => Some(FlowType::Authentication),
            "registration" => Some(FlowType::Registration),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Authentication => "authentication",
            FlowType::Registration => "registration",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(FlowType::parse("authentication"), Some(FlowType::Authentication));
        assert_eq!(FlowType::parse("registration"), Some(FlowType::Registration));
        assert_eq!(FlowType::parse("AUTHENTICATION"), None);
        assert_eq!(FlowType::parse(""), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&FlowType::Authentication).unwrap();
        assert_eq!(json, "\"authentication\"");
        let back: FlowType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FlowType::Authentication);
    }
}
