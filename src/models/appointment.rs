use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_notes: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email_address: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub start_date_time: Option<GraphDateTime>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub staff_member_ids: Vec<String>,
    #[serde(default)]
    pub staff_member_email: Option<String>,
}

impl Appointment {
    pub fn first_customer(&self) -> Option<&Customer> {
        self.customers.first()
    }

    pub fn first_staff_id(&self) -> Option<&str> {
        self.staff_member_ids
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start_date_time.as_ref().and_then(|dt| dt.parse())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub custom_question_answers: Vec<QuestionAnswer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question_id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDateTime {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl GraphDateTime {
    /// Graph emits seven fractional digits (`2025-06-16T10:00:00.0000000`),
    /// sometimes none at all.
    pub fn parse(&self) -> Option<NaiveDateTime> {
        let raw = self.date_time.trim().trim_end_matches('Z');
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}
