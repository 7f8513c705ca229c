use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prospect record created by the intake workflow. Read-only from the
/// booking flow's perspective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeadRecord {
    /// Given name for greetings; "there" when the lead has no usable name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{LeadId, LeadRecord};

    fn lead(name: &str) -> LeadRecord {
        LeadRecord {
            id: LeadId("lead-1".to_string()),
            name: name.to_string(),
            email: None,
            phone: None,
            event_type: None,
            event_date: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn first_name_takes_leading_word() {
        assert_eq!(lead("Jordan Avery").first_name(), "Jordan");
    }

    #[test]
    fn first_name_falls_back_for_blank_names() {
        assert_eq!(lead("   ").first_name(), "there");
    }
}
