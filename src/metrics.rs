use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{
    queue_entry, sea_orm_active_enums::QueueStatus, Account, Business, QueueEntry,
};

/// Seeds the gauges from the database at startup.
pub async fn init_metrics(db: &DatabaseConnection) {
    let account_count = Account::find().count(db).await.unwrap_or(0);
    metrics::gauge!("qnnect_accounts_total").set(account_count as f64);

    let business_count = Business::find().count(db).await.unwrap_or(0);
    metrics::gauge!("qnnect_businesses_total").set(business_count as f64);

    let waiting = QueueEntry::find()
        .filter(queue_entry::Column::Status.eq(QueueStatus::Waiting))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("qnnect_queue_waiting_at_startup").set(waiting as f64);

    tracing::info!(
        "Initialized metrics: Accounts={}, Businesses={}, Waiting={}",
        account_count,
        business_count,
        waiting
    );
}

pub fn record_registration() {
    metrics::gauge!("qnnect_accounts_total").increment(1.0);
}

pub fn record_business_created() {
    metrics::gauge!("qnnect_businesses_total").increment(1.0);
}

pub fn record_join(estimated_wait_minutes: i32) {
    metrics::counter!("qnnect_queue_joins_total").increment(1);
    metrics::histogram!("qnnect_queue_estimated_wait_minutes").record(estimated_wait_minutes as f64);
}

pub fn record_join_rejected(reason: &'static str) {
    metrics::counter!("qnnect_queue_joins_rejected_total", "reason" => reason).increment(1);
}

pub fn record_transition(to: QueueStatus) {
    metrics::counter!("qnnect_queue_transitions_total", "status" => to.as_str()).increment(1);
}
