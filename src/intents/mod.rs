use crate::domain::intent::RegistrationIntent;
use anyhow::Result;
use chrono::{DateTime, Utc};

pub mod store_memory;
pub mod store_redis;

/// Keyed, TTL-bound storage for submitted-but-unpaid registrations.
///
/// `get` treats an expired entry exactly like a missing one; eager cleanup
/// is the sweeper's job and is allowed to lag.
#[async_trait::async_trait]
pub trait IntentStore: Send + Sync {
    /// Stores the intent under its reference, overwriting any prior value.
    /// The entry lives until `intent.expires_at`.
    async fn put(&self, intent: &RegistrationIntent) -> Result<()>;

    async fn get(&self, reference: &str) -> Result<Option<RegistrationIntent>>;

    /// Idempotent; deleting an absent reference is not an error.
    async fn delete(&self, reference: &str) -> Result<()>;

    /// Removes entries past expiry, returns how many were dropped.
    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64>;
}
