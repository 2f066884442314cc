use crate::config::AppConfig;
use crate::services::auth::CredentialProvider;
use crate::services::bookings::AppointmentSource;
use crate::services::helpdesk::TicketSink;

pub struct AppState {
    pub config: AppConfig,
    pub credentials: Box<dyn CredentialProvider>,
    pub bookings: Box<dyn AppointmentSource>,
    pub helpdesk: Box<dyn TicketSink>,
}
