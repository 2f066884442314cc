use async_trait::async_trait;
use serde::Deserialize;

use super::TicketSink;
use crate::errors::SyncError;
use crate::models::{CreatedTicket, TicketCandidate, TicketDetail, TicketFilter, TicketSummary, UserId};
use crate::services::read_json;

#[derive(Debug, Deserialize)]
struct TicketList {
    #[serde(default)]
    tickets: Vec<TicketSummary>,
}

#[derive(Debug, Deserialize)]
struct TicketEnvelope<T> {
    ticket: T,
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserRef>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: UserId,
}

pub struct BossDeskClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl BossDeskClient {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client,
        }
    }

    fn auth_header(&self) -> String {
        format!("ApiKey {}", self.api_key)
    }

    async fn find_user(&self, key: &str, value: &str) -> Result<Option<UserId>, SyncError> {
        let resp = self
            .client
            .get(format!("{}/users", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .query(&[(key, value)])
            .send()
            .await?;

        let list: UserList = read_json(resp, "user lookup").await?;
        Ok(list.users.first().map(|u| u.id))
    }
}

#[async_trait]
impl TicketSink for BossDeskClient {
    async fn list_tickets(&self, filter: Option<&TicketFilter>) -> Result<Vec<TicketSummary>, SyncError> {
        let mut req = self
            .client
            .get(format!("{}/tickets", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header());
        if let Some(filter) = filter {
            req = req.query(&filter.query_pairs());
        }

        let list: TicketList = read_json(req.send().await?, "list tickets").await?;
        Ok(list.tickets)
    }

    async fn get_ticket(&self, id: u64) -> Result<TicketDetail, SyncError> {
        let resp = self
            .client
            .get(format!("{}/tickets/{id}", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let envelope: TicketEnvelope<TicketDetail> = read_json(resp, "get ticket").await?;
        Ok(envelope.ticket)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserId>, SyncError> {
        self.find_user("username", username).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, SyncError> {
        self.find_user("email", email).await
    }

    async fn create_ticket(&self, candidate: &TicketCandidate) -> Result<CreatedTicket, SyncError> {
        let resp = self
            .client
            .post(format!("{}/tickets", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(candidate)
            .send()
            .await?;

        let envelope: TicketEnvelope<CreatedTicket> = read_json(resp, "create ticket").await?;
        Ok(envelope.ticket)
    }
}
