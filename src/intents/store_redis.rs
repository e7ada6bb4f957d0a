use crate::domain::intent::RegistrationIntent;
use crate::intents::IntentStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;

/// Redis-backed intent store. The value key carries a server-side TTL so
/// expiry works even if the sweeper never runs; the expiry-scored index
/// set lets the sweeper clear leftovers without scanning the keyspace.
#[derive(Clone)]
pub struct RedisIntentStore {
    pub client: redis::Client,
}

impl RedisIntentStore {
    pub fn new(redis_url: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
        })
    }

    pub fn intent_key(reference: &str) -> String {
        format!("intent:{reference}")
    }

    pub fn index_key() -> &'static str {
        "intent:index:expiry"
    }
}

#[async_trait::async_trait]
impl IntentStore for RedisIntentStore {
    async fn put(&self, intent: &RegistrationIntent) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(intent)?;
        let ttl_secs = (intent.expires_at - Utc::now()).num_seconds().max(1) as u64;

        let _: () = conn
            .set_ex(Self::intent_key(&intent.reference), payload, ttl_secs)
            .await?;
        let _: usize = conn
            .zadd(
                Self::index_key(),
                intent.reference.clone(),
                intent.expires_at.timestamp(),
            )
            .await?;
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<RegistrationIntent>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(Self::intent_key(reference)).await?;
        let Some(payload) = payload else {
            return Ok(None);
        };

        let intent: RegistrationIntent = serde_json::from_str(&payload)?;
        if intent.is_expired(Utc::now()) {
            // key TTL has not fired yet; behave as if it had
            let _: usize = conn.del(Self::intent_key(reference)).await?;
            let _: usize = conn.zrem(Self::index_key(), reference).await?;
            return Ok(None);
        }
        Ok(Some(intent))
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: usize = conn.del(Self::intent_key(reference)).await?;
        let _: usize = conn.zrem(Self::index_key(), reference).await?;
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let expired: Vec<String> = conn
            .zrangebyscore(Self::index_key(), "-inf", now.timestamp())
            .await?;

        let mut dropped = 0u64;
        for reference in expired {
            let _: usize = conn.del(Self::intent_key(&reference)).await?;
            let _: usize = conn.zrem(Self::index_key(), &reference).await?;
            dropped += 1;
        }
        Ok(dropped)
    }
}
