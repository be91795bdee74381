use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[sea_orm(string_value = "hospital")]
    Hospital,
    #[sea_orm(string_value = "clinic")]
    Clinic,
    #[sea_orm(string_value = "restaurant")]
    Restaurant,
}

impl Default for BusinessType {
    fn default() -> Self {
        Self::Clinic
    }
}

/// Lifecycle stage of a queue entry.
///
/// `Waiting -> Serving -> Completed`, and any non-terminal stage may move to
/// `Cancelled`. `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "serving")]
    Serving,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl QueueStatus {
    /// Stages shown on the dashboards.
    pub const ACTIVE: [QueueStatus; 2] = [QueueStatus::Waiting, QueueStatus::Serving];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Serving => "serving",
            QueueStatus::Completed => "completed",
            QueueStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (QueueStatus::Waiting, QueueStatus::Serving)
                | (QueueStatus::Serving, QueueStatus::Completed)
                | (_, QueueStatus::Cancelled)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn forward_path_is_waiting_serving_completed() {
        assert!(QueueStatus::Waiting.can_transition_to(QueueStatus::Serving));
        assert!(QueueStatus::Serving.can_transition_to(QueueStatus::Completed));
        assert!(!QueueStatus::Waiting.can_transition_to(QueueStatus::Completed));
        assert!(!QueueStatus::Serving.can_transition_to(QueueStatus::Waiting));
    }

    #[test]
    fn terminal_stages_never_move() {
        for next in QueueStatus::iter() {
            assert!(!QueueStatus::Completed.can_transition_to(next));
            assert!(!QueueStatus::Cancelled.can_transition_to(next));
        }
        assert!(QueueStatus::Completed.is_terminal());
        assert!(QueueStatus::Cancelled.is_terminal());
        assert!(!QueueStatus::Serving.is_terminal());
    }

    #[test]
    fn open_entries_can_be_cancelled() {
        assert!(QueueStatus::Waiting.can_transition_to(QueueStatus::Cancelled));
        assert!(QueueStatus::Serving.can_transition_to(QueueStatus::Cancelled));
    }

    #[test]
    fn serializes_as_lowercase() {
        assert_eq!(
            serde_json::to_string(&QueueStatus::Serving).unwrap(),
            "\"serving\""
        );
        assert_eq!(
            serde_json::from_str::<BusinessType>("\"restaurant\"").unwrap(),
            BusinessType::Restaurant
        );
    }
}
