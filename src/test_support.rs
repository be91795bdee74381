//! Shared fixtures for unit tests: an in-memory SQLite database migrated with
//! the real migrator, plus helpers to seed accounts and businesses.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::accounts::{create_account, ensure_user_profile};
use crate::entities::{business, sea_orm_active_enums::BusinessType};
use crate::migrator::Migrator;

pub async fn setup_db() -> DatabaseConnection {
    // A single connection keeps every query on the same in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

/// A time on 2026-10-19.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day(19).and_hms_opt(hour, minute, 0).unwrap()
}

pub async fn create_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let account = create_account(db, email, "not-a-real-hash".into(), at(8, 0))
        .await
        .unwrap();
    ensure_user_profile(db, &account, None, at(8, 0)).await.unwrap();
    account.id
}

pub async fn create_business(
    db: &DatabaseConnection,
    owner_id: Uuid,
    name: &str,
    avg_service_time: i32,
    max_daily_capacity: i32,
) -> business::Model {
    business::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        business_type: Set(BusinessType::Clinic),
        description: Set(format!("{name} walk-in clinic")),
        address: Set("1 Main St".into()),
        phone: Set("+1 555 0100".into()),
        email: Set("front@clinic.test".into()),
        max_daily_capacity: Set(max_daily_capacity),
        avg_service_time: Set(avg_service_time),
        owner_id: Set(owner_id),
        created_at: Set(at(7, 0)),
        updated_at: Set(at(7, 0)),
    }
    .insert(db)
    .await
    .unwrap()
}
