use crate::domain::intent::RegistrationIntent;
use crate::intents::IntentStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local intent store with lazy expiry. Used by tests and local
/// runs without Redis; entries die with the process.
#[derive(Default)]
pub struct MemoryIntentStore {
    entries: Mutex<HashMap<String, RegistrationIntent>>,
}

impl MemoryIntentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IntentStore for MemoryIntentStore {
    async fn put(&self, intent: &RegistrationIntent) -> Result<()> {
        self.entries
            .lock()
            .expect("intent map poisoned")
            .insert(intent.reference.clone(), intent.clone());
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<RegistrationIntent>> {
        let mut entries = self.entries.lock().expect("intent map poisoned");
        match entries.get(reference) {
            Some(intent) if intent.is_expired(Utc::now()) => {
                entries.remove(reference);
                Ok(None)
            }
            Some(intent) => Ok(Some(intent.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("intent map poisoned")
            .remove(reference);
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.lock().expect("intent map poisoned");
        let before = entries.len();
        entries.retain(|_, intent| !intent.is_expired(now));
        Ok((before - entries.len()) as u64)
    }
}
