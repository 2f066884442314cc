pub mod auth;
pub mod bookings;
pub mod correlator;
pub mod helpdesk;
pub mod mapper;
pub mod sync;

use serde::de::DeserializeOwned;

use crate::errors::SyncError;

pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: reqwest::Response,
    what: &str,
) -> Result<T, SyncError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(SyncError::rejection(what, status, truncate(&body, 512)));
    }

    serde_json::from_str(&body).map_err(|e| SyncError::Decode(format!("{what}: {e}")))
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
