use std::collections::HashSet;

use futures::stream::{self, StreamExt};

use crate::models::TicketFilter;
use crate::services::helpdesk::TicketSink;

pub type CorrelationSet = HashSet<String>;

// A failed listing yields an empty set, so the cycle re-submits rather than drops.
pub async fn correlation_set(
    helpdesk: &dyn TicketSink,
    filter: &TicketFilter,
    correlation_field: &str,
    concurrency: usize,
) -> CorrelationSet {
    let summaries = match helpdesk.list_tickets(Some(filter)).await {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "failed to list tickets, assuming none are correlated");
            return CorrelationSet::new();
        }
    };

    let ticket_ids: Vec<u64> = summaries
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| t.id)
        .collect();
    let scanned = ticket_ids.len();

    let known: CorrelationSet = stream::iter(ticket_ids)
        .map(|id| async move { (id, helpdesk.get_ticket(id).await) })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(id, result)| async move {
            match result {
                Ok(detail) => detail.correlation_value(correlation_field),
                Err(e) => {
                    tracing::warn!(ticket_id = id, error = %e, kind = e.kind(), "failed to fetch ticket detail, skipping");
                    None
                }
            }
        })
        .collect()
        .await;

    tracing::debug!(
        listed = summaries.len(),
        scanned,
        correlated = known.len(),
        "built correlation set"
    );
    known
}
