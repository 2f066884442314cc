use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::MAX_POLL_INTERVAL;
use crate::models::Appointment;
use crate::services::correlator;
use crate::services::mapper;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub correlated: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub created: usize,
    pub mapping_failures: usize,
    pub create_failures: usize,
    pub interrupted: bool,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            correlated: 0,
            fetched: 0,
            skipped: 0,
            created: 0,
            mapping_failures: 0,
            create_failures: 0,
            interrupted: false,
        }
    }
}

pub async fn run_cycle(state: &AppState, shutdown: &watch::Receiver<bool>) -> CycleReport {
    let mut report = CycleReport::new();
    let span = tracing::info_span!("cycle", cycle_id = %report.cycle_id);

    async {
        let config = &state.config;
        let known = correlator::correlation_set(
            state.helpdesk.as_ref(),
            &config.ticket_filter,
            &config.mapping.policy.correlation_field,
            config.detail_fetch_concurrency,
        )
        .await;
        report.correlated = known.len();

        let appointments = fetch_appointments(state).await;
        report.fetched = appointments.len();

        let mut submitted: HashSet<&str> = HashSet::new();
        for appointment in &appointments {
            if *shutdown.borrow() {
                tracing::info!("shutdown requested, stopping cycle early");
                report.interrupted = true;
                break;
            }

            // Tickets record the trimmed id.
            let id = appointment.id.trim();
            if known.contains(id) || !submitted.insert(id) {
                report.skipped += 1;
                continue;
            }

            let Some(candidate) =
                mapper::map_appointment(&config.mapping, state.helpdesk.as_ref(), appointment).await
            else {
                report.mapping_failures += 1;
                continue;
            };

            match state.helpdesk.create_ticket(&candidate).await {
                Ok(created) => {
                    report.created += 1;
                    tracing::info!(appointment_id = id, ticket_id = created.id, "created ticket");
                }
                Err(e) => {
                    report.create_failures += 1;
                    tracing::error!(appointment_id = id, error = %e, kind = e.kind(), "failed to create ticket");
                }
            }
        }

        tracing::info!(
            correlated = report.correlated,
            fetched = report.fetched,
            skipped = report.skipped,
            created = report.created,
            mapping_failures = report.mapping_failures,
            create_failures = report.create_failures,
            "cycle finished"
        );
    }
    .instrument(span)
    .await;

    report
}

async fn fetch_appointments(state: &AppState) -> Vec<Appointment> {
    let credential = match state.credentials.get_token().await {
        Ok(credential) => credential,
        Err(e) => {
            tracing::error!(error = %e, "could not obtain booking API token, skipping appointment fetch");
            return Vec::new();
        }
    };

    match state
        .bookings
        .list_appointments(&state.config.business_id, &credential)
        .await
    {
        Ok(appointments) => appointments,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "failed to list appointments");
            Vec::new()
        }
    }
}

pub async fn run(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
    let interval = state.config.poll_interval;
    tracing::info!(interval_secs = interval.as_secs(), "starting sync loop");

    loop {
        let cycle = {
            let state = Arc::clone(&state);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { run_cycle(&state, &shutdown).await })
        };

        if let Err(e) = cycle.await {
            tracing::error!(error = %e, "sync cycle aborted unexpectedly");
        }

        let stop_now = *shutdown.borrow();
        if stop_now || sleep_or_shutdown(interval, &mut shutdown).await {
            tracing::info!("sync loop stopped");
            return;
        }
    }
}

async fn sleep_or_shutdown(interval: std::time::Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let now = Instant::now();
    let deadline = now
        .checked_add(interval)
        .unwrap_or_else(|| now + MAX_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: nobody can ask us to stop any more.
                    tokio::time::sleep_until(deadline).await;
                    return false;
                }
                if *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}
