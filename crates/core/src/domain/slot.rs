use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A named piece of lead information the dialogue collects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Name,
    Phone,
    Location,
    Style,
    Scope,
    Budget,
}

impl Slot {
    pub const ALL: [Slot; 6] =
        [Slot::Name, Slot::Phone, Slot::Location, Slot::Style, Slot::Scope, Slot::Budget];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Location => "location",
            Self::Style => "style",
            Self::Scope => "scope",
            Self::Budget => "budget",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Phone => "Phone",
            Self::Location => "Location",
            Self::Style => "Style",
            Self::Scope => "Scope",
            Self::Budget => "Budget",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "phone" => Ok(Self::Phone),
            "location" => Ok(Self::Location),
            "style" => Ok(Self::Style),
            "scope" => Ok(Self::Scope),
            "budget" => Ok(Self::Budget),
            other => Err(DomainError::UnknownSlot(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Slot;

    #[test]
    fn wire_names_parse_back_to_the_same_slot() {
        for slot in Slot::ALL {
            let parsed: Slot = slot.as_str().parse().expect("wire name should parse");
            assert_eq!(parsed, slot);
        }
    }

    #[test]
    fn unknown_slot_name_is_rejected() {
        assert!("email".parse::<Slot>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let encoded = serde_json::to_string(&Slot::Location).expect("serialize");
        assert_eq!(encoded, "\"location\"");
    }
}
