use chrono::{Duration, Utc};
use registration_payments::domain::intent::{
    IntentLineItem, RegistrantDetails, RegistrationIntent,
};
use registration_payments::intents::store_memory::MemoryIntentStore;
use registration_payments::intents::IntentStore;

#[tokio::test]
async fn stored_intent_round_trips() {
    let store = MemoryIntentStore::new();
    store.put(&intent("ref-123", 60)).await.unwrap();

    let found = store.get("ref-123").await.unwrap().expect("intent present");
    assert_eq!(found.reference, "ref-123");
    assert_eq!(found.amount_minor, 9500);
    assert_eq!(found.registrant.email, "dana@example.org");
}

#[tokio::test]
async fn expired_intent_reads_as_never_stored() {
    let store = MemoryIntentStore::new();
    store.put(&intent("ref-expired", -1)).await.unwrap();

    assert!(store.get("ref-expired").await.unwrap().is_none());
    // lazy expiry dropped it; a repeat read stays absent
    assert!(store.get("ref-expired").await.unwrap().is_none());
}

#[tokio::test]
async fn overwrite_restarts_the_clock() {
    let store = MemoryIntentStore::new();
    store.put(&intent("ref-123", -1)).await.unwrap();
    store.put(&intent("ref-123", 60)).await.unwrap();

    assert!(store.get("ref-123").await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_drops_only_expired_entries() {
    let store = MemoryIntentStore::new();
    store.put(&intent("ref-old", -1)).await.unwrap();
    store.put(&intent("ref-live", 60)).await.unwrap();

    let dropped = store.sweep(Utc::now()).await.unwrap();
    assert_eq!(dropped, 1);
    assert!(store.get("ref-old").await.unwrap().is_none());
    assert!(store.get("ref-live").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = MemoryIntentStore::new();
    store.put(&intent("ref-123", 60)).await.unwrap();

    store.delete("ref-123").await.unwrap();
    store.delete("ref-123").await.unwrap();
    assert!(store.get("ref-123").await.unwrap().is_none());
}

fn intent(reference: &str, ttl_secs: i64) -> RegistrationIntent {
    let now = Utc::now();
    RegistrationIntent {
        reference: reference.to_string(),
        registrant: RegistrantDetails {
            full_name: "Dana Cruz".to_string(),
            email: "dana@example.org".to_string(),
            phone: None,
        },
        form_data: serde_json::json!({"shirt_size": "M"}),
        line_items: vec![IntentLineItem {
            item_code: "main-event".to_string(),
            name: "Main event".to_string(),
            event_date: None,
            unit_price_minor: 9500,
            category: "general".to_string(),
        }],
        amount_minor: 9500,
        currency: "eur".to_string(),
        created_at: now,
        expires_at: now + Duration::seconds(ttl_secs),
    }
}
