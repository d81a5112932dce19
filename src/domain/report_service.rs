//! Reporting aggregator: read-only fleet and workload summaries.
//!
//! Every query recomputes from the stores on each call; there is no cache
//! to invalidate and the numbers are always as fresh as the stores.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::auth::Actor;
use crate::domain::error::Error;
use crate::domain::identity_service::map_repository_error;
use crate::domain::ports::{DeviceRepository, TicketRepository, UserRepository};
use crate::domain::ticket::{Ticket, TicketStatus};
use crate::domain::user::{DeviceType, Role, UserId};

/// Ticket totals per workflow status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatusCount {
    pub status: TicketStatus,
    pub count: usize,
}

/// Device totals per terminal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTypeCount {
    pub device_type: DeviceType,
    pub count: usize,
}

/// One row of the per-person workload report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRow {
    pub user_id: UserId,
    pub name: String,
    pub count: usize,
}

/// Expert answered counts and agent created counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport {
    pub answered_by_expert: Vec<WorkloadRow>,
    pub created_by_agent: Vec<WorkloadRow>,
}

/// Average creation-to-last-update durations, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DurationReport {
    pub average_answer_ms: Option<f64>,
    pub average_resolve_ms: Option<f64>,
}

/// Read-only summaries for management dashboards. Manager-only.
#[derive(Clone)]
pub struct ReportService {
    tickets: Arc<dyn TicketRepository>,
    devices: Arc<dyn DeviceRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReportService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        devices: Arc<dyn DeviceRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tickets,
            devices,
            users,
        }
    }

    /// Ticket counts grouped by workflow status.
    pub async fn tickets_by_status(&self, actor: &Actor) -> Result<Vec<TicketStatusCount>, Error> {
        require_manager(actor)?;
        let tickets = self.tickets.list().await.map_err(map_repository_error)?;
        let mut counts: HashMap<TicketStatus, usize> = HashMap::new();
        for ticket in &tickets {
            *counts.entry(ticket.status()).or_default() += 1;
        }
        let mut rows: Vec<_> = counts
            .into_iter()
            .map(|(status, count)| TicketStatusCount { status, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    /// Device counts grouped by terminal type.
    pub async fn devices_by_type(&self, actor: &Actor) -> Result<Vec<DeviceTypeCount>, Error> {
        require_manager(actor)?;
        let devices = self.devices.list().await.map_err(map_repository_error)?;
        let mut counts: HashMap<DeviceType, usize> = HashMap::new();
        for device in &devices {
            *counts.entry(device.device_type()).or_default() += 1;
        }
        let mut rows: Vec<_> = counts
            .into_iter()
            .map(|(device_type, count)| DeviceTypeCount { device_type, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    /// Per-expert answered counts and per-agent created counts.
    pub async fn workload(&self, actor: &Actor) -> Result<WorkloadReport, Error> {
        require_manager(actor)?;
        let tickets = self.tickets.list().await.map_err(map_repository_error)?;
        let users = self.users.list().await.map_err(map_repository_error)?;
        let names: HashMap<UserId, (String, Role)> = users
            .into_iter()
            .map(|u| (u.id(), (u.name().to_owned(), u.role())))
            .collect();

        let mut answered: HashMap<UserId, usize> = HashMap::new();
        let mut created: HashMap<UserId, usize> = HashMap::new();
        for ticket in &tickets {
            // Only tickets currently awaiting the reporter count against the
            // expert; once resolved or confirmed the work is off their plate.
            if ticket.status() == TicketStatus::Answered {
                if let Some(expert) = ticket.expert() {
                    *answered.entry(expert).or_default() += 1;
                }
            }
            *created.entry(ticket.creator()).or_default() += 1;
        }

        let rows = |counts: HashMap<UserId, usize>, role: Role| {
            let mut rows: Vec<_> = counts
                .into_iter()
                .filter_map(|(user_id, count)| {
                    names
                        .get(&user_id)
                        .filter(|(_, r)| *r == role)
                        .map(|(name, _)| WorkloadRow {
                            user_id,
                            name: name.clone(),
                            count,
                        })
                })
                .collect();
            rows.sort_by(|a, b| b.count.cmp(&a.count));
            rows
        };

        Ok(WorkloadReport {
            answered_by_expert: rows(answered, Role::Expert),
            created_by_agent: rows(created, Role::Agent),
        })
    }

    /// Average creation-to-last-update durations for answered and resolved
    /// tickets, in milliseconds. Empty groups report `None`.
    pub async fn durations(&self, actor: &Actor) -> Result<DurationReport, Error> {
        require_manager(actor)?;
        let tickets = self.tickets.list().await.map_err(map_repository_error)?;
        Ok(DurationReport {
            average_answer_ms: average_ms(&tickets, TicketStatus::Answered),
            average_resolve_ms: average_ms(&tickets, TicketStatus::Resolved),
        })
    }
}

fn require_manager(actor: &Actor) -> Result<(), Error> {
    if actor.role.is_manager() {
        Ok(())
    } else {
        Err(Error::forbidden("reports require a manager role"))
    }
}

fn average_ms(tickets: &[Ticket], status: TicketStatus) -> Option<f64> {
    let durations: Vec<i64> = tickets
        .iter()
        .filter(|t| t.status() == status)
        .map(|t| (t.updated_at() - t.created_at()).num_milliseconds())
        .collect();
    if durations.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod tests;
