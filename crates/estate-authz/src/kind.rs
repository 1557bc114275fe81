use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// What sort of host feature a capability gates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    #[default]
    Screen,
    Action,
    Report,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::Screen => "screen",
            CapabilityKind::Action => "action",
            CapabilityKind::Report => "report",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CapabilityKind {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "screen" => Ok(CapabilityKind::Screen),
            "action" => Ok(CapabilityKind::Action),
            "report" => Ok(CapabilityKind::Report),
            _ => Err(AuthzError::InvalidCapabilityKind(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CapabilityKind;
    use crate::AuthzError;

    #[test]
    fn kind_string_roundtrip() {
        for kind in [
            CapabilityKind::Screen,
            CapabilityKind::Action,
            CapabilityKind::Report,
        ] {
            assert_eq!(kind.as_str().parse::<CapabilityKind>().ok(), Some(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(
            " Report ".parse::<CapabilityKind>().ok(),
            Some(CapabilityKind::Report)
        );
    }

    #[test]
    fn kind_parse_invalid() {
        let err = "menu".parse::<CapabilityKind>().expect_err("unknown kind");
        assert!(matches!(err, AuthzError::InvalidCapabilityKind(s) if s == "menu"));
    }
}
