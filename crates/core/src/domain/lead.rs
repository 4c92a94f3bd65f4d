use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Converted => "converted",
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "converted" => Ok(Self::Converted),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown lead status `{other}` (expected new|contacted|converted)"
            ))),
        }
    }
}

/// A captured contact record for a prospective customer. Append-only apart
/// from admin status updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub source: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub source: String,
}

impl NewLead {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "lead requires a name and an email".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LeadStatus, NewLead};

    #[test]
    fn status_round_trips_through_strings() {
        for status in [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Converted] {
            assert_eq!(status.as_str().parse::<LeadStatus>().expect("parse"), status);
        }
        assert!("archived".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn lead_requires_name_and_email() {
        let lead = NewLead {
            name: "".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            session_id: None,
            source: "quote".to_string(),
        };
        assert!(lead.validate().is_err());
    }
}
