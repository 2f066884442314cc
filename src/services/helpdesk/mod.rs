pub mod bossdesk;

use async_trait::async_trait;

use crate::errors::SyncError;
use crate::models::{CreatedTicket, TicketCandidate, TicketDetail, TicketFilter, TicketSummary, UserId};

#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn list_tickets(&self, filter: Option<&TicketFilter>) -> Result<Vec<TicketSummary>, SyncError>;

    async fn get_ticket(&self, id: u64) -> Result<TicketDetail, SyncError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserId>, SyncError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, SyncError>;

    async fn create_ticket(&self, candidate: &TicketCandidate) -> Result<CreatedTicket, SyncError>;
}
