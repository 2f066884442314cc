use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::AppointmentSource;
use crate::errors::SyncError;
use crate::models::Appointment;
use crate::services::auth::Credential;
use crate::services::read_json;

const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct AppointmentPage {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

pub struct GraphBookingsSource {
    base_url: String,
    client: reqwest::Client,
}

impl GraphBookingsSource {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { base_url, client }
    }

    fn appointments_url(&self, business_id: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&format!("{}/solutions/bookingBusinesses", self.base_url))
            .map_err(|e| SyncError::Config(format!("invalid Graph endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("Graph endpoint cannot be a base URL".to_string()))?
            .push(business_id)
            .push("appointments");
        Ok(url)
    }
}

#[async_trait]
impl AppointmentSource for GraphBookingsSource {
    async fn list_appointments(
        &self,
        business_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Appointment>, SyncError> {
        let mut next = Some(self.appointments_url(business_id)?.to_string());
        let mut appointments = Vec::new();
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                tracing::warn!(pages = MAX_PAGES, "appointment listing truncated at page limit");
                break;
            }

            let resp = self
                .client
                .get(&url)
                .bearer_auth(credential.secret())
                .send()
                .await?;
            let page: AppointmentPage = read_json(resp, "list appointments").await?;

            appointments.extend(decode_appointments(page.value));
            next = page.next_link;
        }

        tracing::debug!(count = appointments.len(), pages, "listed appointments");
        Ok(appointments)
    }
}

// One malformed record is skipped, not the whole page.
fn decode_appointments(raw: Vec<Value>) -> Vec<Appointment> {
    raw.into_iter()
        .filter_map(|value| {
            let id = value
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("<missing>")
                .to_string();
            match serde_json::from_value::<Appointment>(value) {
                Ok(appt) => Some(appt),
                Err(e) => {
                    tracing::warn!(appointment_id = %id, error = %e, "skipping undecodable appointment");
                    None
                }
            }
        })
        .collect()
}
