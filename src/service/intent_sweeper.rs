use crate::intents::IntentStore;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

/// Background loop discarding intents whose TTL elapsed. Deletion is
/// idempotent, so racing an in-flight materialization is harmless; a
/// too-early sweep surfaces later as a missing-intent reconciliation.
#[derive(Clone)]
pub struct IntentSweeper {
    pub intents: Arc<dyn IntentStore>,
    pub interval: std::time::Duration,
}

impl IntentSweeper {
    pub async fn run(self) {
        loop {
            match self.tick().await {
                Ok(dropped) if dropped > 0 => {
                    tracing::info!(dropped, "swept expired registration intents");
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!("intent sweep error: {}", err);
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn tick(&self) -> Result<u64> {
        self.intents.sweep(Utc::now()).await
    }
}
