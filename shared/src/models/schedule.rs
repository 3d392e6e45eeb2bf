//! Calendar-anchored order schedules
//!
//! Schedules plan deliveries outside the PR/PO approval flow. Only three
//! statuses are persisted; everything the dashboard shows (due soon,
//! delayed, partial receive) is derived on read from the scheduled date
//! and receipt progress.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Lookahead window for flagging schedules that need imminent attention
pub const DUE_SOON_HORIZON_DAYS: u64 = 3;

/// Persisted schedule status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "SCHEDULED",
            ScheduleStatus::Completed => "COMPLETED",
            ScheduleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(ScheduleStatus::Scheduled),
            "COMPLETED" => Ok(ScheduleStatus::Completed),
            "CANCELLED" => Ok(ScheduleStatus::Cancelled),
            other => Err(format!("Unknown schedule status: {}", other)),
        }
    }
}

/// Derived display state, never persisted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScheduleDisplayState {
    Scheduled,
    DueSoon,
    Delayed,
    PartialReceive,
    Completed,
    Cancelled,
}

impl std::fmt::Display for ScheduleDisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScheduleDisplayState::Scheduled => "Scheduled",
            ScheduleDisplayState::DueSoon => "Due Soon",
            ScheduleDisplayState::Delayed => "Delayed",
            ScheduleDisplayState::PartialReceive => "Partial Receive",
            ScheduleDisplayState::Completed => "Completed",
            ScheduleDisplayState::Cancelled => "Cancelled",
        };
        write!(f, "{}", label)
    }
}

/// A planned order line with receipt progress
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderScheduleLine {
    pub inventory_id: Uuid,
    pub qty: i64,
    #[serde(default)]
    pub received_qty: i64,
}

/// Collapse duplicate items in a schedule's lines
///
/// Receipts address schedule lines by item, so a schedule carries at
/// most one line per item: quantities sum into the first occurrence.
pub fn merge_schedule_lines(lines: Vec<OrderScheduleLine>) -> Vec<OrderScheduleLine> {
    let mut merged: Vec<OrderScheduleLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged
            .iter_mut()
            .find(|m| m.inventory_id == line.inventory_id)
        {
            Some(existing) => {
                existing.qty += line.qty;
                existing.received_qty += line.received_qty;
            }
            None => merged.push(line),
        }
    }
    merged
}

/// A planned, calendar-anchored order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSchedule {
    pub id: Uuid,
    pub scheduled_date: NaiveDate,
    pub created_by: String,
    pub supplier_id: Uuid,
    pub remark: String,
    pub status: ScheduleStatus,
    pub lines: Vec<OrderScheduleLine>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl OrderSchedule {
    pub fn total_qty(&self) -> i64 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    pub fn received_qty(&self) -> i64 {
        self.lines.iter().map(|l| l.received_qty).sum()
    }

    pub fn outstanding_qty(&self) -> i64 {
        self.total_qty() - self.received_qty()
    }

    /// Display state evaluated against a date-only "today"
    pub fn display_state(&self, today: NaiveDate) -> ScheduleDisplayState {
        match self.status {
            ScheduleStatus::Cancelled => ScheduleDisplayState::Cancelled,
            ScheduleStatus::Completed => ScheduleDisplayState::Completed,
            ScheduleStatus::Scheduled => {
                if self.outstanding_qty() == 0 {
                    ScheduleDisplayState::Completed
                } else if self.received_qty() > 0 {
                    ScheduleDisplayState::PartialReceive
                } else if self.scheduled_date < today {
                    ScheduleDisplayState::Delayed
                } else if self.scheduled_date <= today + Days::new(DUE_SOON_HORIZON_DAYS) {
                    ScheduleDisplayState::DueSoon
                } else {
                    ScheduleDisplayState::Scheduled
                }
            }
        }
    }

    /// Postpone to a new date; only an open schedule may move
    pub fn reschedule(&mut self, new_date: NaiveDate) -> DomainResult<()> {
        self.guard_scheduled("rescheduled")?;
        self.scheduled_date = new_date;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.guard_scheduled("cancelled")?;
        self.status = ScheduleStatus::Cancelled;
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.guard_scheduled("completed")?;
        self.status = ScheduleStatus::Completed;
        Ok(())
    }

    fn guard_scheduled(&self, action: &str) -> DomainResult<()> {
        if self.status != ScheduleStatus::Scheduled {
            return Err(DomainError::InvalidStateTransition(format!(
                "Only a SCHEDULED order can be {} (current: {})",
                action,
                self.status.as_str()
            )));
        }
        Ok(())
    }
}
