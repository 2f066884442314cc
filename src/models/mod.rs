pub mod appointment;
pub mod field_map;
pub mod ticket;

pub use appointment::{Appointment, Customer, GraphDateTime, QuestionAnswer};
pub use field_map::{EmployeeDetails, QuestionFieldMap, SemanticField, StaffMap, NOT_PROVIDED};
pub use ticket::{
    CreatedTicket, Requester, TicketCandidate, TicketDetail, TicketFilter, TicketSummary, UserId,
};
