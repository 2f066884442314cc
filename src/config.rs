use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::SyncError;
use crate::models::{QuestionFieldMap, StaffMap, TicketFilter};

pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_NOTES_DELIMITER: &str = "TeamsMeetingSeparator";
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContactSource {
    #[default]
    CustomerAnswers,
    AppointmentFields,
}

impl ContactSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer_answers" => Some(ContactSource::CustomerAnswers),
            "appointment_fields" => Some(ContactSource::AppointmentFields),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TicketPolicy {
    pub ticket_type: String,
    pub category: String,
    pub group: String,
    pub priority: u8,
    pub correlation_field: String,
}

impl Default for TicketPolicy {
    fn default() -> Self {
        Self {
            ticket_type: "Service Request".to_string(),
            category: "Onboarding".to_string(),
            group: "Service Desk".to_string(),
            priority: 2,
            correlation_field: "75".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MappingConfig {
    pub contact_source: ContactSource,
    pub organization_domain: String,
    pub resolve_requester: bool,
    pub notes_delimiter: String,
    pub question_map: QuestionFieldMap,
    pub staff_map: StaffMap,
    pub policy: TicketPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            contact_source: ContactSource::default(),
            organization_domain: String::new(),
            resolve_requester: true,
            notes_delimiter: DEFAULT_NOTES_DELIMITER.to_string(),
            question_map: QuestionFieldMap::default(),
            staff_map: StaffMap::default(),
            policy: TicketPolicy::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub graph_api_endpoint: String,
    pub graph_token_url: String,
    pub graph_client_id: String,
    pub graph_client_secret: String,
    pub graph_scope: String,
    pub business_id: String,
    pub helpdesk_api_endpoint: String,
    pub helpdesk_api_key: String,
    pub ticket_filter: TicketFilter,
    pub mapping: MappingConfig,
    pub poll_interval: Duration,
    pub detail_fetch_concurrency: usize,
    pub http_timeout: Duration,
    pub log_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| SyncError::Config(format!("{key} must be set")))
        };

        let policy_defaults = TicketPolicy::default();
        let policy = TicketPolicy {
            ticket_type: get("TICKET_TYPE").unwrap_or(policy_defaults.ticket_type),
            category: get("TICKET_CATEGORY").unwrap_or(policy_defaults.category),
            group: get("TICKET_GROUP").unwrap_or(policy_defaults.group),
            priority: parse_or(get("TICKET_PRIORITY"), "TICKET_PRIORITY", policy_defaults.priority)?,
            correlation_field: get("CORRELATION_FIELD")
                .unwrap_or(policy_defaults.correlation_field),
        };

        let question_map = match get("QUESTION_FIELD_MAP") {
            Some(json) => QuestionFieldMap::from_json(&json)
                .map_err(|e| SyncError::Config(format!("QUESTION_FIELD_MAP is invalid: {e}")))?,
            None => QuestionFieldMap::default(),
        };
        let staff_map = match get("STAFF_AGENT_MAP") {
            Some(json) => StaffMap::from_json(&json)
                .map_err(|e| SyncError::Config(format!("STAFF_AGENT_MAP is invalid: {e}")))?,
            None => StaffMap::default(),
        };

        let contact_source = match get("CONTACT_SOURCE") {
            Some(raw) => ContactSource::parse(&raw).ok_or_else(|| {
                SyncError::Config(format!(
                    "CONTACT_SOURCE must be customer_answers or appointment_fields, got {raw:?}"
                ))
            })?,
            None => ContactSource::default(),
        };

        let resolve_requester = match get("RESOLVE_REQUESTER") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                SyncError::Config(format!("RESOLVE_REQUESTER must be true or false, got {raw:?}"))
            })?,
            None => true,
        };

        let poll_secs = parse_or(get("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS", 300u64)?;
        if poll_secs == 0 || poll_secs > MAX_POLL_INTERVAL.as_secs() {
            return Err(SyncError::Config(format!(
                "POLL_INTERVAL_SECS must be between 1 and {}, got {poll_secs}",
                MAX_POLL_INTERVAL.as_secs()
            )));
        }

        let ticket_filter = TicketFilter {
            subject_contains: get("TICKET_FILTER_SUBJECT"),
            category: get("TICKET_FILTER_CATEGORY").or_else(|| Some(policy.category.clone())),
        };

        let mapping = MappingConfig {
            contact_source,
            organization_domain: get("ORGANIZATION_DOMAIN")
                .map(|d| d.trim_start_matches('@').to_string())
                .unwrap_or_default(),
            resolve_requester,
            notes_delimiter: get("NOTES_DELIMITER")
                .unwrap_or_else(|| DEFAULT_NOTES_DELIMITER.to_string()),
            question_map,
            staff_map,
            policy,
        };

        Ok(Self {
            graph_api_endpoint: trim_base(required("GRAPH_API_ENDPOINT")?),
            graph_token_url: required("GRAPH_TOKEN_URL")?,
            graph_client_id: required("GRAPH_CLIENT_ID")?,
            graph_client_secret: required("GRAPH_CLIENT_SECRET")?,
            graph_scope: get("GRAPH_SCOPE").unwrap_or_else(|| DEFAULT_GRAPH_SCOPE.to_string()),
            business_id: required("BOOKINGS_BUSINESS_ID")?,
            helpdesk_api_endpoint: trim_base(required("HELPDESK_API_ENDPOINT")?),
            helpdesk_api_key: required("HELPDESK_API_KEY")?,
            ticket_filter,
            mapping,
            poll_interval: Duration::from_secs(poll_secs),
            detail_fetch_concurrency: parse_or(
                get("DETAIL_FETCH_CONCURRENCY"),
                "DETAIL_FETCH_CONCURRENCY",
                8usize,
            )?
            .max(1),
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                30u64,
            )?),
            log_dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, SyncError> {
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| SyncError::Config(format!("{key} must be a number, got {v:?}"))),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
