//! Queue rules: numbering, wait estimates and status transitions.
//!
//! The database-facing operations live in [`service`]; everything here is pure
//! so the rules can be checked without a connection.

pub mod service;

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{DbErr, SqlErr};
use serde::Deserialize;
use thiserror::Error;

use crate::entities::sea_orm_active_enums::QueueStatus;

pub use service::{
    advance_entry, cancel_entry, join_queue, list_business_queue, list_user_queues, queue_stats,
    BusinessQueueEntry, QueueStats, UserQueueEntry,
};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Business not found")]
    BusinessNotFound,

    #[error("Queue entry not found")]
    EntryNotFound,

    #[error("Not allowed to change this queue entry")]
    NotOwner,

    #[error("Already waiting in this queue")]
    AlreadyQueued,

    #[error("Daily capacity of {capacity} reached")]
    CapacityReached { capacity: i32 },

    #[error("Cannot move queue entry from {from} to {to}")]
    InvalidTransition { from: QueueStatus, to: QueueStatus },

    /// The ticket number collided with an existing row for that day.
    #[error("Queue number already taken, try again")]
    NumberTaken,

    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for QueueError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => QueueError::NumberTaken,
            _ => QueueError::Database(err),
        }
    }
}

/// Stage a business can push an entry into from its dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceTarget {
    Serving,
    Completed,
}

impl From<AdvanceTarget> for QueueStatus {
    fn from(target: AdvanceTarget) -> Self {
        match target {
            AdvanceTarget::Serving => QueueStatus::Serving,
            AdvanceTarget::Completed => QueueStatus::Completed,
        }
    }
}

/// Calendar day (UTC) a queue number is issued for. Numbering restarts daily.
pub fn service_day(now: NaiveDateTime) -> NaiveDate {
    now.date()
}

/// Naive estimate fixed at join time: everyone already waiting times the
/// configured service time.
pub fn estimate_wait(waiting_count: u64, avg_service_time: i32) -> i32 {
    let waiting = i32::try_from(waiting_count).unwrap_or(i32::MAX);
    waiting.saturating_mul(avg_service_time.max(0))
}

pub fn ensure_transition(from: QueueStatus, to: QueueStatus) -> Result<(), QueueError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(QueueError::InvalidTransition { from, to })
    }
}
