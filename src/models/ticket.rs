use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type UserId = u64;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TicketSummary {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TicketDetail {
    pub id: u64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

impl TicketDetail {
    /// Appointment id stored in the correlation slot, if any. Numbers are
    /// accepted as well as strings; null and blank values count as absent.
    pub fn correlation_value(&self, key: &str) -> Option<String> {
        match self.custom_fields.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedTicket {
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilter {
    pub subject_contains: Option<String>,
    pub category: Option<String>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &TicketSummary) -> bool {
        if let Some(needle) = &self.subject_contains {
            let subject = ticket.subject.as_deref().unwrap_or("");
            if !subject.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            // Summaries that omit the category were already scoped server-side.
            if let Some(actual) = &ticket.category {
                if actual != category {
                    return false;
                }
            }
        }
        true
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(subject) = &self.subject_contains {
            pairs.push(("subject", subject.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Requester {
    #[serde(rename = "requester_id")]
    Id(UserId),
    #[serde(rename = "requester_username")]
    Username(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketCandidate {
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub category: String,
    pub group: String,
    pub priority: u8,
    pub custom_fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responder_id: Option<UserId>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Requester>,
}

impl TicketCandidate {
    pub fn correlation_value(&self, key: &str) -> Option<&str> {
        self.custom_fields.get(key).map(|s| s.as_str())
    }
}
