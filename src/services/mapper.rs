use std::collections::BTreeMap;

use askama::Template;

use crate::config::{ContactSource, MappingConfig};
use crate::models::{
    Appointment, EmployeeDetails, Requester, SemanticField, TicketCandidate, UserId, NOT_PROVIDED,
};
use crate::services::helpdesk::TicketSink;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("appointment has no id")]
    MissingId,

    #[error("appointment has no customer record")]
    NoCustomer,

    #[error("failed to render description: {0}")]
    Render(String),
}

struct DescriptionRow<'a> {
    label: &'static str,
    value: &'a str,
}

#[derive(Template)]
#[template(path = "ticket_description.html")]
struct DescriptionTemplate<'a> {
    rows: Vec<DescriptionRow<'a>>,
    notes: Vec<&'a str>,
}

const DESCRIPTION_FIELDS: [(&str, SemanticField); 8] = [
    ("Manager Name", SemanticField::ManagerName),
    ("Manager Email", SemanticField::ManagerEmail),
    ("Manager Phone", SemanticField::ManagerPhone),
    ("Employee Name", SemanticField::EmployeeName),
    ("Employee Phone", SemanticField::EmployeePhone),
    ("Employee Email", SemanticField::EmployeeEmail),
    ("Employee Type", SemanticField::EmployeeType),
    ("Employee ID", SemanticField::EmployeeId),
];

pub async fn map_appointment(
    config: &MappingConfig,
    helpdesk: &dyn TicketSink,
    appointment: &Appointment,
) -> Option<TicketCandidate> {
    match try_map_appointment(config, helpdesk, appointment).await {
        Ok(candidate) => Some(candidate),
        Err(e) => {
            tracing::error!(
                appointment_id = %appointment.id,
                service = appointment.service_name.as_deref().unwrap_or(""),
                error = %e,
                "failed to map appointment to ticket"
            );
            None
        }
    }
}

pub async fn try_map_appointment(
    config: &MappingConfig,
    helpdesk: &dyn TicketSink,
    appointment: &Appointment,
) -> Result<TicketCandidate, MappingError> {
    let appointment_id = appointment.id.trim();
    if appointment_id.is_empty() {
        return Err(MappingError::MissingId);
    }

    let details = collect_details(config, appointment)?;
    let notes = strip_meeting_link(
        appointment.service_notes.as_deref().unwrap_or(""),
        &config.notes_delimiter,
    );

    let responder_id = resolve_agent(config, helpdesk, appointment).await;
    let requester = resolve_requester(config, helpdesk, appointment_id, &details).await;

    let policy = &config.policy;
    Ok(TicketCandidate {
        subject: build_subject(appointment, &details),
        description: build_description(&details, notes)?,
        ticket_type: policy.ticket_type.clone(),
        category: policy.category.clone(),
        group: policy.group.clone(),
        priority: policy.priority,
        custom_fields: BTreeMap::from([(
            policy.correlation_field.clone(),
            appointment_id.to_string(),
        )]),
        responder_id,
        requester,
    })
}

// Question answers from the first customer apply under either contact source.
pub fn collect_details(
    config: &MappingConfig,
    appointment: &Appointment,
) -> Result<EmployeeDetails, MappingError> {
    let customer = appointment.first_customer();
    let mut details = EmployeeDetails::default();

    match config.contact_source {
        ContactSource::CustomerAnswers => {
            if customer.is_none() {
                return Err(MappingError::NoCustomer);
            }
        }
        ContactSource::AppointmentFields => {
            let pick = |top: &Option<String>, nested: Option<&Option<String>>| {
                top.clone()
                    .filter(|v| !v.trim().is_empty())
                    .or_else(|| nested.and_then(|v| v.clone()))
            };
            if let Some(name) = pick(&appointment.customer_name, customer.map(|c| &c.name)) {
                details.set(SemanticField::EmployeeName, &name);
            }
            if let Some(email) = pick(
                &appointment.customer_email_address,
                customer.map(|c| &c.email_address),
            ) {
                details.set(SemanticField::EmployeeEmail, &email);
            }
            if let Some(phone) = pick(&appointment.customer_phone, customer.map(|c| &c.phone)) {
                details.set(SemanticField::EmployeePhone, &phone);
            }
        }
    }

    if let Some(customer) = customer {
        for qa in &customer.custom_question_answers {
            let Some(field) = config.question_map.resolve(&qa.question_id) else {
                continue;
            };
            if let Some(answer) = &qa.answer {
                details.set(field, answer);
            }
        }
    }

    Ok(details)
}

pub fn strip_meeting_link<'a>(notes: &'a str, delimiter: &str) -> &'a str {
    let kept = if delimiter.is_empty() {
        notes
    } else {
        notes.split(delimiter).next().unwrap_or(notes)
    };
    kept.trim()
}

pub fn build_subject(appointment: &Appointment, details: &EmployeeDetails) -> String {
    let service = appointment
        .service_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Appointment");
    let mut subject = format!("{service} - {}", details.display(SemanticField::EmployeeName));
    if let Some(start) = appointment.start() {
        subject.push_str(&format!(" ({})", start.format("%Y-%m-%d %H:%M")));
    }
    subject
}

pub fn build_description(details: &EmployeeDetails, notes: &str) -> Result<String, MappingError> {
    let notes = if notes.is_empty() { NOT_PROVIDED } else { notes };
    let template = DescriptionTemplate {
        rows: DESCRIPTION_FIELDS
            .iter()
            .map(|&(label, field)| DescriptionRow {
                label,
                value: details.display(field),
            })
            .collect(),
        notes: notes.lines().collect(),
    };
    template
        .render()
        .map_err(|e| MappingError::Render(e.to_string()))
}

pub fn derive_username<'a>(email: &'a str, organization_domain: &str) -> Option<&'a str> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    if local.is_empty() || organization_domain.is_empty() {
        return None;
    }
    domain
        .eq_ignore_ascii_case(organization_domain)
        .then_some(local)
}

async fn resolve_agent(
    config: &MappingConfig,
    helpdesk: &dyn TicketSink,
    appointment: &Appointment,
) -> Option<UserId> {
    match appointment.first_staff_id() {
        Some(staff_id) => match config.staff_map.agent_for(staff_id) {
            Some(agent) => return Some(agent),
            None => tracing::warn!(
                appointment_id = %appointment.id,
                staff_id,
                "staff member has no agent mapping"
            ),
        },
        None => tracing::warn!(appointment_id = %appointment.id, "appointment has no staff member"),
    }

    let email = appointment
        .staff_member_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())?;
    match helpdesk.find_user_by_email(email).await {
        Ok(Some(agent)) => Some(agent),
        Ok(None) => {
            tracing::warn!(appointment_id = %appointment.id, staff_email = email, "no agent found for staff email");
            None
        }
        Err(e) => {
            tracing::warn!(appointment_id = %appointment.id, staff_email = email, error = %e, "agent lookup failed");
            None
        }
    }
}

async fn resolve_requester(
    config: &MappingConfig,
    helpdesk: &dyn TicketSink,
    appointment_id: &str,
    details: &EmployeeDetails,
) -> Option<Requester> {
    let Some(email) = details.get(SemanticField::EmployeeEmail) else {
        tracing::warn!(appointment_id, "no employee email, ticket will have no requester");
        return None;
    };
    let Some(username) = derive_username(email, &config.organization_domain) else {
        tracing::warn!(
            appointment_id,
            email,
            domain = %config.organization_domain,
            "employee email is outside the organization domain, ticket will have no requester"
        );
        return None;
    };

    if !config.resolve_requester {
        return Some(Requester::Username(username.to_string()));
    }

    match helpdesk.find_user_by_username(username).await {
        Ok(Some(id)) => Some(Requester::Id(id)),
        Ok(None) => {
            tracing::warn!(appointment_id, username, "requester not found");
            None
        }
        Err(e) => {
            tracing::warn!(appointment_id, username, error = %e, "requester lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::SyncError;
    use crate::models::{
        CreatedTicket, Customer, GraphDateTime, QuestionAnswer, QuestionFieldMap, StaffMap,
        TicketDetail, TicketFilter, TicketSummary,
    };

    #[derive(Default)]
    struct LookupSink {
        users: Vec<(String, UserId)>,
        fail_lookups: bool,
        lookups: Arc<Mutex<Vec<String>>>,
    }

    impl LookupSink {
        fn lookup(&self, key: &str) -> Result<Option<UserId>, SyncError> {
            self.lookups.lock().unwrap().push(key.to_string());
            if self.fail_lookups {
                return Err(SyncError::Decode("boom".to_string()));
            }
            Ok(self.users.iter().find(|(k, _)| k == key).map(|(_, id)| *id))
        }
    }

    #[async_trait]
    impl TicketSink for LookupSink {
        async fn list_tickets(&self, _: Option<&TicketFilter>) -> Result<Vec<TicketSummary>, SyncError> {
            Ok(vec![])
        }

        async fn get_ticket(&self, id: u64) -> Result<TicketDetail, SyncError> {
            Ok(TicketDetail { id, ..Default::default() })
        }

        async fn find_user_by_username(&self, username: &str) -> Result<Option<UserId>, SyncError> {
            self.lookup(username)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, SyncError> {
            self.lookup(email)
        }

        async fn create_ticket(&self, _: &TicketCandidate) -> Result<CreatedTicket, SyncError> {
            Ok(CreatedTicket { id: 1 })
        }
    }

    fn qa(question_id: &str, answer: &str) -> QuestionAnswer {
        QuestionAnswer {
            question_id: question_id.to_string(),
            question: None,
            answer: Some(answer.to_string()),
        }
    }

    fn config() -> MappingConfig {
        MappingConfig {
            organization_domain: "example.com".to_string(),
            question_map: [
                ("Q1".to_string(), SemanticField::EmployeeName),
                ("Q2".to_string(), SemanticField::EmployeeEmail),
                ("Q3".to_string(), SemanticField::ManagerName),
                ("Q4".to_string(), SemanticField::EmployeeType),
            ]
            .into_iter()
            .collect::<QuestionFieldMap>(),
            staff_map: [("staff-1".to_string(), 501)].into_iter().collect::<StaffMap>(),
            ..Default::default()
        }
    }

    fn appointment(answers: Vec<QuestionAnswer>) -> Appointment {
        Appointment {
            id: "A1".to_string(),
            service_name: Some("New Hire Setup".to_string()),
            service_notes: Some("Bring laptop TeamsMeetingSeparator https://teams.example/join".to_string()),
            customers: vec![Customer {
                custom_question_answers: answers,
                ..Default::default()
            }],
            staff_member_ids: vec!["staff-1".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_maps_answers_and_strips_meeting_link() {
        let sink = LookupSink::default();
        let mut cfg = config();
        cfg.question_map = [("Q1".to_string(), SemanticField::EmployeeName)]
            .into_iter()
            .collect();

        let candidate = try_map_appointment(&cfg, &sink, &appointment(vec![qa("Q1", "Jane")]))
            .await
            .unwrap();

        assert!(candidate.description.contains("Jane"));
        assert!(candidate.description.contains("Bring laptop"));
        assert!(!candidate.description.contains("https://"));
        assert!(!candidate.description.contains("TeamsMeetingSeparator"));
        assert_eq!(candidate.subject, "New Hire Setup - Jane");
        assert_eq!(candidate.correlation_value("75"), Some("A1"));
        assert_eq!(candidate.responder_id, Some(501));
        assert_eq!(candidate.ticket_type, "Service Request");
        assert_eq!(candidate.priority, 2);
    }

    #[tokio::test]
    async fn test_unmapped_question_is_ignored() {
        let sink = LookupSink::default();
        let candidate = try_map_appointment(
            &config(),
            &sink,
            &appointment(vec![qa("Q1", "Jane"), qa("Q-unknown", "favourite colour teal")]),
        )
        .await
        .unwrap();
        assert!(!candidate.description.contains("teal"));
    }

    #[tokio::test]
    async fn test_unanswered_fields_render_placeholder() {
        let sink = LookupSink::default();
        let candidate = try_map_appointment(&config(), &sink, &appointment(vec![]))
            .await
            .unwrap();
        assert!(candidate
            .description
            .contains("<p><strong>Manager Name:</strong> Not Provided</p>"));
        assert!(candidate.subject.ends_with("- Not Provided"));
    }

    #[tokio::test]
    async fn test_description_field_order() {
        let sink = LookupSink::default();
        let candidate = try_map_appointment(
            &config(),
            &sink,
            &appointment(vec![qa("Q1", "Jane"), qa("Q3", "Morgan"), qa("Q4", "Contractor")]),
        )
        .await
        .unwrap();
        let d = &candidate.description;
        let manager = d.find("Morgan").unwrap();
        let name = d.find("Jane").unwrap();
        let kind = d.find("Contractor").unwrap();
        let notes = d.find("Special Instructions").unwrap();
        assert!(manager < name && name < kind && kind < notes);
    }

    #[tokio::test]
    async fn test_no_customer_is_mapping_failure() {
        let sink = LookupSink::default();
        let mut appt = appointment(vec![]);
        appt.customers.clear();

        let result = try_map_appointment(&config(), &sink, &appt).await;
        assert_eq!(result.unwrap_err(), MappingError::NoCustomer);
        assert!(map_appointment(&config(), &sink, &appt).await.is_none());
    }

    #[tokio::test]
    async fn test_blank_id_is_mapping_failure() {
        let sink = LookupSink::default();
        let mut appt = appointment(vec![]);
        appt.id = "  ".to_string();
        let result = try_map_appointment(&config(), &sink, &appt).await;
        assert_eq!(result.unwrap_err(), MappingError::MissingId);
    }

    #[tokio::test]
    async fn test_appointment_fields_strategy() {
        let sink = LookupSink {
            users: vec![("jdoe".to_string(), 9001)],
            ..Default::default()
        };
        let mut cfg = config();
        cfg.contact_source = ContactSource::AppointmentFields;

        let mut appt = appointment(vec![]);
        appt.customers.clear();
        appt.customer_name = Some("Jane Doe".to_string());
        appt.customer_email_address = Some("jdoe@example.com".to_string());
        appt.customer_phone = Some("555-0100".to_string());

        let candidate = try_map_appointment(&cfg, &sink, &appt).await.unwrap();
        assert!(candidate.description.contains("Jane Doe"));
        assert!(candidate.description.contains("555-0100"));
        assert_eq!(candidate.requester, Some(Requester::Id(9001)));
    }

    #[tokio::test]
    async fn test_appointment_fields_fall_back_to_customer_record() {
        let sink = LookupSink::default();
        let mut cfg = config();
        cfg.contact_source = ContactSource::AppointmentFields;

        let mut appt = appointment(vec![]);
        appt.customers[0].name = Some("Sam Lee".to_string());
        let details = collect_details(&cfg, &appt).unwrap();
        assert_eq!(details.get(SemanticField::EmployeeName), Some("Sam Lee"));
    }

    #[tokio::test]
    async fn test_requester_resolved_from_org_email() {
        let sink = LookupSink {
            users: vec![("jane".to_string(), 42)],
            ..Default::default()
        };
        let candidate = try_map_appointment(
            &config(),
            &sink,
            &appointment(vec![qa("Q2", "jane@Example.com")]),
        )
        .await
        .unwrap();
        assert_eq!(candidate.requester, Some(Requester::Id(42)));
    }

    #[tokio::test]
    async fn test_requester_outside_domain_is_none() {
        let sink = LookupSink::default();
        let candidate = try_map_appointment(
            &config(),
            &sink,
            &appointment(vec![qa("Q2", "jane@gmail.com")]),
        )
        .await
        .unwrap();
        assert_eq!(candidate.requester, None);
        assert!(sink.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_email_yields_no_requester() {
        let sink = LookupSink::default();
        let candidate = try_map_appointment(&config(), &sink, &appointment(vec![qa("Q1", "Jane")]))
            .await
            .unwrap();
        assert_eq!(candidate.requester, None);
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade_to_unassigned() {
        let sink = LookupSink {
            fail_lookups: true,
            ..Default::default()
        };
        let mut appt = appointment(vec![qa("Q2", "jane@example.com")]);
        appt.staff_member_ids = vec!["staff-unknown".to_string()];
        appt.staff_member_email = Some("tech@example.com".to_string());

        let candidate = try_map_appointment(&config(), &sink, &appt).await.unwrap();
        assert_eq!(candidate.requester, None);
        assert_eq!(candidate.responder_id, None);
        assert_eq!(
            *sink.lookups.lock().unwrap(),
            vec!["tech@example.com".to_string(), "jane".to_string()]
        );
    }

    #[tokio::test]
    async fn test_agent_resolved_from_staff_email() {
        let sink = LookupSink {
            users: vec![("tech@example.com".to_string(), 700)],
            ..Default::default()
        };
        let mut appt = appointment(vec![]);
        appt.staff_member_ids.clear();
        appt.staff_member_email = Some("tech@example.com".to_string());

        let candidate = try_map_appointment(&config(), &sink, &appt).await.unwrap();
        assert_eq!(candidate.responder_id, Some(700));
    }

    #[tokio::test]
    async fn test_username_passthrough_when_lookup_disabled() {
        let sink = LookupSink::default();
        let mut cfg = config();
        cfg.resolve_requester = false;

        let candidate = try_map_appointment(&cfg, &sink, &appointment(vec![qa("Q2", "jane@example.com")]))
            .await
            .unwrap();
        assert_eq!(candidate.requester, Some(Requester::Username("jane".to_string())));
        assert!(sink.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mapping_is_idempotent() {
        let sink = LookupSink {
            users: vec![("jane".to_string(), 42)],
            ..Default::default()
        };
        let appt = appointment(vec![qa("Q1", "Jane"), qa("Q2", "jane@example.com")]);
        let first = try_map_appointment(&config(), &sink, &appt).await.unwrap();
        let second = try_map_appointment(&config(), &sink, &appt).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strip_meeting_link() {
        assert_eq!(
            strip_meeting_link("Bring laptop TeamsMeetingSeparator https://x", "TeamsMeetingSeparator"),
            "Bring laptop"
        );
        assert_eq!(
            strip_meeting_link("  no link here \n", "TeamsMeetingSeparator"),
            "no link here"
        );
        assert_eq!(
            strip_meeting_link("a teamsmeetingseparator b", "TeamsMeetingSeparator"),
            "a teamsmeetingseparator b"
        );
        assert_eq!(
            strip_meeting_link("x TeamsMeetingSeparator y TeamsMeetingSeparator z", "TeamsMeetingSeparator"),
            "x"
        );
    }

    #[test]
    fn test_derive_username() {
        assert_eq!(derive_username("jane@example.com", "example.com"), Some("jane"));
        assert_eq!(derive_username("jane@EXAMPLE.com", "example.com"), Some("jane"));
        assert_eq!(derive_username("jane@other.com", "example.com"), None);
        assert_eq!(derive_username("not-an-email", "example.com"), None);
        assert_eq!(derive_username("@example.com", "example.com"), None);
        assert_eq!(derive_username("jane@example.com", ""), None);
    }

    #[test]
    fn test_subject_includes_start_time() {
        let mut appt = appointment(vec![]);
        appt.start_date_time = Some(GraphDateTime {
            date_time: "2025-06-16T10:00:00.0000000".to_string(),
            time_zone: Some("UTC".to_string()),
        });
        let mut details = EmployeeDetails::default();
        details.set(SemanticField::EmployeeName, "Jane");
        assert_eq!(
            build_subject(&appt, &details),
            "New Hire Setup - Jane (2025-06-16 10:00)"
        );
    }

    #[test]
    fn test_description_escapes_html() {
        let mut details = EmployeeDetails::default();
        details.set(SemanticField::EmployeeName, "<script>x</script>");
        let html = build_description(&details, "a & b").unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_description_notes_keep_line_breaks() {
        let html = build_description(&EmployeeDetails::default(), "line one\nline two").unwrap();
        assert!(html.contains("<p>line one<br>line two</p>"));
        assert!(html.contains("<p><strong>Employee ID:</strong> Not Provided</p>"));

        let empty = build_description(&EmployeeDetails::default(), "").unwrap();
        assert!(empty.contains("<p>Not Provided</p>"));
    }
}
