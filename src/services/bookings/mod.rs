pub mod graph;

use async_trait::async_trait;

use crate::errors::SyncError;
use crate::models::Appointment;
use crate::services::auth::Credential;

#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn list_appointments(
        &self,
        business_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Appointment>, SyncError>;
}
