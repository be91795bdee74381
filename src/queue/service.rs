use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::{ensure_transition, estimate_wait, service_day, AdvanceTarget, QueueError};
use crate::entities::{
    business, queue_counter, queue_entry, sea_orm_active_enums::QueueStatus, user_profile,
    Business, QueueCounter, QueueEntry, UserProfile,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueStats {
    pub waiting: u64,
    pub serving: u64,
    pub completed_today: u64,
    pub avg_wait_time: i32,
}

/// A caller's own ticket, with the business it belongs to.
#[derive(Clone, Debug, Serialize)]
pub struct UserQueueEntry {
    #[serde(flatten)]
    pub entry: queue_entry::Model,
    pub business: Option<business::Model>,
    /// Waiting entries with a lower number on the same day; 0 once serving.
    pub people_ahead: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Customer {
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct BusinessQueueEntry {
    #[serde(flatten)]
    pub entry: queue_entry::Model,
    pub customer: Option<Customer>,
}

impl From<user_profile::Model> for Customer {
    fn from(profile: user_profile::Model) -> Self {
        Self {
            full_name: profile.full_name,
            phone: profile.phone,
        }
    }
}

/// Issues the next ticket for `user_id` at `business_id`.
///
/// Runs in one transaction holding a row lock on the business, so concurrent
/// joins for the same business are serialized: the number comes from the
/// per-day counter and the estimate from the waiting count seen under the
/// same lock.
///
/// The open-ticket check and the waiting count look at every day, so an entry
/// left `waiting` from an earlier day still blocks a rejoin and still counts
/// toward the estimate until the business closes it out. A number collision
/// against the unique index surfaces as [`QueueError::NumberTaken`].
pub async fn join_queue(
    db: &DatabaseConnection,
    business_id: Uuid,
    user_id: Uuid,
    now: NaiveDateTime,
) -> Result<queue_entry::Model, QueueError> {
    let txn = db.begin().await?;

    let business = Business::find_by_id(business_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(QueueError::BusinessNotFound)?;

    let open = QueueEntry::find()
        .filter(queue_entry::Column::BusinessId.eq(business_id))
        .filter(queue_entry::Column::UserId.eq(user_id))
        .filter(queue_entry::Column::Status.is_in(QueueStatus::ACTIVE))
        .count(&txn)
        .await?;
    if open > 0 {
        return Err(QueueError::AlreadyQueued);
    }

    let day = service_day(now);
    let queue_number = reserve_queue_number(&txn, business_id, day).await?;
    if queue_number > business.max_daily_capacity {
        // Dropping the transaction rolls the counter back
        return Err(QueueError::CapacityReached {
            capacity: business.max_daily_capacity,
        });
    }

    let waiting = count_with_status(&txn, business_id, QueueStatus::Waiting).await?;

    let entry = queue_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(business_id),
        user_id: Set(user_id),
        queue_number: Set(queue_number),
        service_date: Set(day),
        status: Set(QueueStatus::Waiting),
        estimated_wait_time: Set(estimate_wait(waiting, business.avg_service_time)),
        joined_at: Set(now),
        called_at: Set(None),
        completed_at: Set(None),
        notes: Set(String::new()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        business_id = %business_id,
        user_id = %user_id,
        queue_number,
        "Queue entry issued"
    );
    Ok(entry)
}

/// Bumps the (business, day) counter and returns the number it now holds.
/// Callers must hold the business row lock.
async fn reserve_queue_number<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    day: NaiveDate,
) -> Result<i32, DbErr> {
    let counter = QueueCounter::find()
        .filter(queue_counter::Column::BusinessId.eq(business_id))
        .filter(queue_counter::Column::ServiceDate.eq(day))
        .one(conn)
        .await?;

    match counter {
        Some(counter) => {
            let next = counter.last_number + 1;
            let mut active: queue_counter::ActiveModel = counter.into();
            active.last_number = Set(next);
            active.update(conn).await?;
            Ok(next)
        }
        None => {
            queue_counter::ActiveModel {
                id: Set(Uuid::new_v4()),
                business_id: Set(business_id),
                service_date: Set(day),
                last_number: Set(1),
            }
            .insert(conn)
            .await?;
            Ok(1)
        }
    }
}

/// Business-side status change. Only the owner of the entry's business may
/// call an entry (`serving`) or finish it (`completed`).
pub async fn advance_entry(
    db: &DatabaseConnection,
    owner_id: Uuid,
    entry_id: Uuid,
    target: AdvanceTarget,
    now: NaiveDateTime,
) -> Result<queue_entry::Model, QueueError> {
    let txn = db.begin().await?;

    let entry = QueueEntry::find_by_id(entry_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(QueueError::EntryNotFound)?;

    let business = Business::find_by_id(entry.business_id)
        .one(&txn)
        .await?
        .ok_or(QueueError::BusinessNotFound)?;
    if business.owner_id != owner_id {
        return Err(QueueError::NotOwner);
    }

    let next = QueueStatus::from(target);
    ensure_transition(entry.status, next)?;

    let joined_at = entry.joined_at;
    let called_at = entry.called_at;
    let mut active: queue_entry::ActiveModel = entry.into();
    active.status = Set(next);
    match target {
        AdvanceTarget::Serving => active.called_at = Set(Some(now.max(joined_at))),
        AdvanceTarget::Completed => {
            let finished = called_at.map_or(now, |called| now.max(called));
            active.completed_at = Set(Some(finished));
        }
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// User-side cancellation of the caller's own open entry.
pub async fn cancel_entry(
    db: &DatabaseConnection,
    user_id: Uuid,
    entry_id: Uuid,
) -> Result<queue_entry::Model, QueueError> {
    let txn = db.begin().await?;

    let entry = QueueEntry::find_by_id(entry_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(QueueError::EntryNotFound)?;
    if entry.user_id != user_id {
        return Err(QueueError::NotOwner);
    }
    ensure_transition(entry.status, QueueStatus::Cancelled)?;

    let mut active: queue_entry::ActiveModel = entry.into();
    active.status = Set(QueueStatus::Cancelled);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn queue_stats(
    db: &DatabaseConnection,
    business: &business::Model,
    now: NaiveDateTime,
) -> Result<QueueStats, DbErr> {
    let waiting = count_with_status(db, business.id, QueueStatus::Waiting).await?;
    let serving = count_with_status(db, business.id, QueueStatus::Serving).await?;
    let completed_today = QueueEntry::find()
        .filter(queue_entry::Column::BusinessId.eq(business.id))
        .filter(queue_entry::Column::Status.eq(QueueStatus::Completed))
        .filter(queue_entry::Column::ServiceDate.eq(service_day(now)))
        .count(db)
        .await?;

    Ok(QueueStats {
        waiting,
        serving,
        completed_today,
        avg_wait_time: business.avg_service_time,
    })
}

/// Open entries of one user, newest first.
pub async fn list_user_queues(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<UserQueueEntry>, DbErr> {
    let rows = QueueEntry::find()
        .filter(queue_entry::Column::UserId.eq(user_id))
        .filter(queue_entry::Column::Status.is_in(QueueStatus::ACTIVE))
        .order_by_desc(queue_entry::Column::JoinedAt)
        .find_also_related(Business)
        .all(db)
        .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for (entry, business) in rows {
        let people_ahead = if entry.status == QueueStatus::Waiting {
            QueueEntry::find()
                .filter(queue_entry::Column::BusinessId.eq(entry.business_id))
                .filter(queue_entry::Column::ServiceDate.eq(entry.service_date))
                .filter(queue_entry::Column::Status.eq(QueueStatus::Waiting))
                .filter(queue_entry::Column::QueueNumber.lt(entry.queue_number))
                .count(db)
                .await?
        } else {
            0
        };
        entries.push(UserQueueEntry {
            entry,
            business,
            people_ahead,
        });
    }
    Ok(entries)
}

/// Open entries of one business in ticket order.
pub async fn list_business_queue(
    db: &DatabaseConnection,
    business_id: Uuid,
) -> Result<Vec<BusinessQueueEntry>, DbErr> {
    let rows = QueueEntry::find()
        .filter(queue_entry::Column::BusinessId.eq(business_id))
        .filter(queue_entry::Column::Status.is_in(QueueStatus::ACTIVE))
        .order_by_asc(queue_entry::Column::ServiceDate)
        .order_by_asc(queue_entry::Column::QueueNumber)
        .find_also_related(UserProfile)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, profile)| BusinessQueueEntry {
            entry,
            customer: profile.map(Customer::from),
        })
        .collect())
}

async fn count_with_status<C: ConnectionTrait>(
    conn: &C,
    business_id: Uuid,
    status: QueueStatus,
) -> Result<u64, DbErr> {
    QueueEntry::find()
        .filter(queue_entry::Column::BusinessId.eq(business_id))
        .filter(queue_entry::Column::Status.eq(status))
        .count(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, create_business, create_user, day, setup_db};

    #[tokio::test]
    async fn sequential_joins_number_from_one_and_estimate_from_waiting() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let carol = create_user(&db, "carol@example.com").await;

        let a = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        let b = join_queue(&db, clinic.id, bob, at(9, 5)).await.unwrap();
        let c = join_queue(&db, clinic.id, carol, at(9, 10)).await.unwrap();

        assert_eq!(
            (a.queue_number, b.queue_number, c.queue_number),
            (1, 2, 3)
        );
        assert_eq!(
            (a.estimated_wait_time, b.estimated_wait_time, c.estimated_wait_time),
            (0, 15, 30)
        );
        assert_eq!(a.status, QueueStatus::Waiting);
        assert_eq!(a.service_date, day(19));
    }

    #[tokio::test]
    async fn numbering_restarts_on_the_next_day() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 10, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        let today = join_queue(&db, clinic.id, alice, at(23, 50)).await.unwrap();
        cancel_entry(&db, alice, today.id).await.unwrap();

        let tomorrow = day(20).and_hms_opt(8, 0, 0).unwrap();
        let first = join_queue(&db, clinic.id, alice, tomorrow).await.unwrap();
        let second = join_queue(&db, clinic.id, bob, tomorrow).await.unwrap();

        assert_eq!(today.queue_number, 1);
        assert_eq!(first.queue_number, 1);
        assert_eq!(second.queue_number, 2);
        assert_eq!(first.service_date, day(20));
    }

    #[tokio::test]
    async fn a_user_holds_one_open_ticket_per_business() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 10, 100).await;
        let alice = create_user(&db, "alice@example.com").await;

        let first = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        let again = join_queue(&db, clinic.id, alice, at(9, 1)).await;
        assert!(matches!(again, Err(QueueError::AlreadyQueued)));

        cancel_entry(&db, alice, first.id).await.unwrap();
        let rejoined = join_queue(&db, clinic.id, alice, at(9, 2)).await.unwrap();
        assert_eq!(rejoined.queue_number, 2);
    }

    #[tokio::test]
    async fn joins_beyond_daily_capacity_are_refused() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@diner.test").await;
        let diner = create_business(&db, owner, "Diner", 5, 1).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        join_queue(&db, diner.id, alice, at(12, 0)).await.unwrap();
        let refused = join_queue(&db, diner.id, bob, at(12, 1)).await;
        assert!(matches!(
            refused,
            Err(QueueError::CapacityReached { capacity: 1 })
        ));

        // The refused join must not burn a number
        let counter = QueueCounter::find()
            .filter(queue_counter::Column::BusinessId.eq(diner.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.last_number, 1);
    }

    #[tokio::test]
    async fn colliding_number_is_reported_as_taken() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 10, 100).await;
        let alice = create_user(&db, "alice@example.com").await;

        // A row holding number 1 that the day's counter knows nothing about
        queue_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(clinic.id),
            user_id: Set(alice),
            queue_number: Set(1),
            service_date: Set(day(19)),
            status: Set(QueueStatus::Completed),
            estimated_wait_time: Set(0),
            joined_at: Set(at(8, 0)),
            called_at: Set(None),
            completed_at: Set(None),
            notes: Set(String::new()),
        }
        .insert(&db)
        .await
        .unwrap();

        let result = join_queue(&db, clinic.id, alice, at(9, 0)).await;
        assert!(matches!(result, Err(QueueError::NumberTaken)));

        let open = QueueEntry::find()
            .filter(queue_entry::Column::BusinessId.eq(clinic.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(open, 1);
    }

    #[tokio::test]
    async fn joining_an_unknown_business_fails() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let result = join_queue(&db, Uuid::new_v4(), alice, at(9, 0)).await;
        assert!(matches!(result, Err(QueueError::BusinessNotFound)));
    }

    #[tokio::test]
    async fn advancing_stamps_called_and_completed_times() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let entry = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();

        let serving = advance_entry(&db, owner, entry.id, AdvanceTarget::Serving, at(9, 20))
            .await
            .unwrap();
        assert_eq!(serving.status, QueueStatus::Serving);
        let called_at = serving.called_at.unwrap();
        assert!(called_at >= serving.joined_at);

        let done = advance_entry(&db, owner, entry.id, AdvanceTarget::Completed, at(9, 35))
            .await
            .unwrap();
        assert_eq!(done.status, QueueStatus::Completed);
        assert!(done.completed_at.unwrap() >= called_at);
    }

    #[tokio::test]
    async fn completion_time_never_precedes_call_time() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let entry = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();

        advance_entry(&db, owner, entry.id, AdvanceTarget::Serving, at(9, 30))
            .await
            .unwrap();
        // Skewed clock on the completing request
        let done = advance_entry(&db, owner, entry.id, AdvanceTarget::Completed, at(9, 10))
            .await
            .unwrap();
        assert_eq!(done.completed_at, Some(at(9, 30)));
    }

    #[tokio::test]
    async fn illegal_transitions_are_rejected() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let entry = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();

        let skipped = advance_entry(&db, owner, entry.id, AdvanceTarget::Completed, at(9, 5)).await;
        assert!(matches!(
            skipped,
            Err(QueueError::InvalidTransition {
                from: QueueStatus::Waiting,
                to: QueueStatus::Completed
            })
        ));

        advance_entry(&db, owner, entry.id, AdvanceTarget::Serving, at(9, 6))
            .await
            .unwrap();
        let twice = advance_entry(&db, owner, entry.id, AdvanceTarget::Serving, at(9, 7)).await;
        assert!(matches!(twice, Err(QueueError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn only_the_owner_can_advance() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let entry = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();

        let result = advance_entry(&db, alice, entry.id, AdvanceTarget::Serving, at(9, 1)).await;
        assert!(matches!(result, Err(QueueError::NotOwner)));

        let missing =
            advance_entry(&db, owner, Uuid::new_v4(), AdvanceTarget::Serving, at(9, 1)).await;
        assert!(matches!(missing, Err(QueueError::EntryNotFound)));
    }

    #[tokio::test]
    async fn cancellation_is_irreversible() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let entry = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();

        let stranger = cancel_entry(&db, bob, entry.id).await;
        assert!(matches!(stranger, Err(QueueError::NotOwner)));

        let cancelled = cancel_entry(&db, alice, entry.id).await.unwrap();
        assert_eq!(cancelled.status, QueueStatus::Cancelled);

        assert!(matches!(
            cancel_entry(&db, alice, entry.id).await,
            Err(QueueError::InvalidTransition { .. })
        ));
        assert!(matches!(
            advance_entry(&db, owner, entry.id, AdvanceTarget::Serving, at(9, 5)).await,
            Err(QueueError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn stats_follow_the_serving_then_completing_scenario() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let first = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        join_queue(&db, clinic.id, bob, at(9, 1)).await.unwrap();

        let before = queue_stats(&db, &clinic, at(9, 2)).await.unwrap();
        assert_eq!(
            before,
            QueueStats {
                waiting: 2,
                serving: 0,
                completed_today: 0,
                avg_wait_time: 15
            }
        );

        advance_entry(&db, owner, first.id, AdvanceTarget::Serving, at(9, 3))
            .await
            .unwrap();
        let serving = queue_stats(&db, &clinic, at(9, 4)).await.unwrap();
        assert_eq!((serving.waiting, serving.serving), (1, 1));

        advance_entry(&db, owner, first.id, AdvanceTarget::Completed, at(9, 20))
            .await
            .unwrap();
        let after = queue_stats(&db, &clinic, at(9, 21)).await.unwrap();
        assert_eq!(after.completed_today, serving.completed_today + 1);
        assert_eq!(after.waiting, serving.waiting);
        assert_eq!(after.serving, 0);
    }

    #[tokio::test]
    async fn user_listing_reports_people_ahead() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let carol = create_user(&db, "carol@example.com").await;

        let a = join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        join_queue(&db, clinic.id, bob, at(9, 1)).await.unwrap();
        join_queue(&db, clinic.id, carol, at(9, 2)).await.unwrap();
        advance_entry(&db, owner, a.id, AdvanceTarget::Serving, at(9, 3))
            .await
            .unwrap();

        let carol_view = list_user_queues(&db, carol).await.unwrap();
        assert_eq!(carol_view.len(), 1);
        assert_eq!(carol_view[0].people_ahead, 1);
        assert_eq!(carol_view[0].business.as_ref().unwrap().id, clinic.id);

        let alice_view = list_user_queues(&db, alice).await.unwrap();
        assert_eq!(alice_view[0].entry.status, QueueStatus::Serving);
        assert_eq!(alice_view[0].people_ahead, 0);
    }

    #[tokio::test]
    async fn business_listing_is_in_ticket_order_with_customers() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@clinic.test").await;
        let clinic = create_business(&db, owner, "Northside", 15, 100).await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let carol = create_user(&db, "carol@example.com").await;

        join_queue(&db, clinic.id, alice, at(9, 0)).await.unwrap();
        let b = join_queue(&db, clinic.id, bob, at(9, 1)).await.unwrap();
        join_queue(&db, clinic.id, carol, at(9, 2)).await.unwrap();
        cancel_entry(&db, bob, b.id).await.unwrap();

        let listing = list_business_queue(&db, clinic.id).await.unwrap();
        let numbers: Vec<i32> = listing.iter().map(|e| e.entry.queue_number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(listing[1].customer.as_ref().unwrap().full_name, "carol");
    }
}
