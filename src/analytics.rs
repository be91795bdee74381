//! Daily rollups for the business dashboard.

use chrono::{NaiveDate, Timelike};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{
    business_analytics, queue_entry, sea_orm_active_enums::QueueStatus, BusinessAnalytics,
    QueueEntry,
};

/// How many days the dashboard shows.
pub const HISTORY_DAYS: u64 = 30;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DailySummary {
    pub total_served: i32,
    pub total_cancelled: i32,
    /// Mean whole minutes from joining to being called.
    pub avg_wait_time: i32,
    /// UTC hour with the most joins; earliest hour wins ties.
    pub peak_hour: i32,
}

pub fn summarize(entries: &[queue_entry::Model]) -> DailySummary {
    let mut summary = DailySummary::default();
    let mut joins_per_hour = [0u32; 24];
    let mut waited_minutes = 0i64;
    let mut called = 0i64;

    for entry in entries {
        match entry.status {
            QueueStatus::Completed => summary.total_served += 1,
            QueueStatus::Cancelled => summary.total_cancelled += 1,
            QueueStatus::Waiting | QueueStatus::Serving => {}
        }
        if let Some(called_at) = entry.called_at {
            waited_minutes += (called_at - entry.joined_at).num_minutes().max(0);
            called += 1;
        }
        joins_per_hour[entry.joined_at.hour() as usize] += 1;
    }

    if called > 0 {
        summary.avg_wait_time = i32::try_from(waited_minutes / called).unwrap_or(i32::MAX);
    }

    let mut peak = 0;
    for (hour, joins) in joins_per_hour.iter().enumerate() {
        if *joins > joins_per_hour[peak] {
            peak = hour;
        }
    }
    summary.peak_hour = peak as i32;

    summary
}

/// Recomputes the rollup of `date` for a business and stores it.
pub async fn record_daily(
    db: &DatabaseConnection,
    business_id: Uuid,
    date: NaiveDate,
) -> Result<business_analytics::Model, DbErr> {
    let entries = QueueEntry::find()
        .filter(queue_entry::Column::BusinessId.eq(business_id))
        .filter(queue_entry::Column::ServiceDate.eq(date))
        .all(db)
        .await?;
    let summary = summarize(&entries);

    let existing = BusinessAnalytics::find()
        .filter(business_analytics::Column::BusinessId.eq(business_id))
        .filter(business_analytics::Column::Date.eq(date))
        .one(db)
        .await?;

    match existing {
        Some(row) => {
            let mut active: business_analytics::ActiveModel = row.into();
            apply(&mut active, &summary);
            active.update(db).await
        }
        None => {
            let mut active = business_analytics::ActiveModel {
                id: Set(Uuid::new_v4()),
                business_id: Set(business_id),
                date: Set(date),
                ..Default::default()
            };
            apply(&mut active, &summary);
            active.insert(db).await
        }
    }
}

fn apply(active: &mut business_analytics::ActiveModel, summary: &DailySummary) {
    active.total_served = Set(summary.total_served);
    active.total_cancelled = Set(summary.total_cancelled);
    active.avg_wait_time = Set(summary.avg_wait_time);
    active.peak_hour = Set(summary.peak_hour);
}

pub async fn recent(
    db: &DatabaseConnection,
    business_id: Uuid,
) -> Result<Vec<business_analytics::Model>, DbErr> {
    BusinessAnalytics::find()
        .filter(business_analytics::Column::BusinessId.eq(business_id))
        .order_by_desc(business_analytics::Column::Date)
        .limit(HISTORY_DAYS)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{advance_entry, cancel_entry, join_queue, AdvanceTarget};
    use crate::test_support::{at, create_business, create_user, day, setup_db};

    fn entry(
        status: QueueStatus,
        joined: (u32, u32),
        called: Option<(u32, u32)>,
    ) -> queue_entry::Model {
        queue_entry::Model {
            id: Uuid::new_v4(),
            business_id: Uuid::nil(),
            user_id: Uuid::nil(),
            queue_number: 1,
            service_date: day(19),
            status,
            estimated_wait_time: 0,
            joined_at: at(joined.0, joined.1),
            called_at: called.map(|(h, m)| at(h, m)),
            completed_at: None,
            notes: String::new(),
        }
    }

    #[test]
    fn empty_day_is_all_zero() {
        assert_eq!(summarize(&[]), DailySummary::default());
    }

    #[test]
    fn summary_counts_outcomes_waits_and_peak() {
        let entries = vec![
            entry(QueueStatus::Completed, (9, 0), Some((9, 10))),
            entry(QueueStatus::Completed, (10, 0), Some((10, 30))),
            entry(QueueStatus::Cancelled, (10, 15), None),
            entry(QueueStatus::Serving, (10, 40), Some((10, 45))),
            entry(QueueStatus::Waiting, (11, 0), None),
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total_served, 2);
        assert_eq!(summary.total_cancelled, 1);
        // (10 + 30 + 5) / 3
        assert_eq!(summary.avg_wait_time, 15);
        assert_eq!(summary.peak_hour, 10);
    }

    #[test]
    fn earliest_hour_wins_a_tie() {
        let entries = vec![
            entry(QueueStatus::Waiting, (14, 0), None),
            entry(QueueStatus::Waiting, (8, 0), None),
        ];
        assert_eq!(summarize(&entries).peak_hour, 8);
    }

    #[tokio::test]
    async fn rollup_is_upserted_per_day() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        let a = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        let b = join_queue(&db, clinic.id, bob, at(9, 5)).await.unwrap();
        advance_entry(&db, owner, a.id, AdvanceTarget::Serving, at(9, 20))
            .await
            .unwrap();

        let first = record_daily(&db, clinic.id, day(19)).await.unwrap();
        assert_eq!(first.total_served, 0);
        assert_eq!(first.avg_wait_time, 20);
        assert_eq!(first.peak_hour, 9);

        advance_entry(&db, owner, a.id, AdvanceTarget::Completed, at(9, 40))
            .await
            .unwrap();
        cancel_entry(&db, bob, b.id).await.unwrap();

        let second = record_daily(&db, clinic.id, day(19)).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.total_served, 1);
        assert_eq!(second.total_cancelled, 1);

        let history = recent(&db, clinic.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }
}
