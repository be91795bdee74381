pub mod account;
pub mod business;
pub mod business_analytics;
pub mod queue_counter;
pub mod queue_entry;
pub mod sea_orm_active_enums;
pub mod user_profile;

pub use account::Entity as Account;
pub use business::Entity as Business;
pub use business_analytics::Entity as BusinessAnalytics;
pub use queue_counter::Entity as QueueCounter;
pub use queue_entry::Entity as QueueEntry;
pub use user_profile::Entity as UserProfile;
