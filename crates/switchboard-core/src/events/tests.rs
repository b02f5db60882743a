use super::*;
use crate::criteria::SelectionReason;
use crate::usage::{BudgetAlert, BudgetWindow};
use uuid::Uuid;

#[tokio::test]
async fn test_publish_subscribe() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();

    let request_id = Uuid::new_v4();
    bus.publish(RouterEvent::ProviderSwitched {
        request_id,
        from: "openai".to_string(),
        to: "local".to_string(),
        error: "generation failed".to_string(),
    });

    let event = rx.recv().await.unwrap();
    assert_eq!(event.request_id(), Some(request_id));
    match event {
        RouterEvent::ProviderSwitched { from, to, .. } => {
            assert_eq!(from, "openai");
            assert_eq!(to, "local");
        }
        _ => panic!("unexpected event type"),
    }
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = EventBus::new(16);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    let count = bus.publish(RouterEvent::Initialized {
        providers: vec!["local".to_string()],
        ready: vec![],
    });
    assert_eq!(count, 2);

    assert_eq!(rx1.recv().await.unwrap().kind(), "initialized");
    assert_eq!(rx2.recv().await.unwrap().kind(), "initialized");
}

#[test]
fn test_publish_without_subscribers() {
    let bus = EventBus::default();
    let count = bus.publish(RouterEvent::Initialized {
        providers: vec![],
        ready: vec![],
    });
    assert_eq!(count, 0);
}

#[test]
fn test_event_serialization() {
    let event = RouterEvent::ResponseGenerated {
        request_id: Uuid::nil(),
        provider_id: "groq".to_string(),
        reason: SelectionReason::Speed,
        response_time_ms: 420,
        tokens: 96,
        cost: 0.0001,
        fallback_used: false,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "response_generated");
    assert_eq!(json["provider_id"], "groq");
    assert_eq!(json["reason"], "speed");

    let alert = RouterEvent::BudgetAlert(BudgetAlert {
        provider_id: "openai".to_string(),
        window: BudgetWindow::Daily,
        threshold_limit: 5.0,
        current_usage: 4.2,
        percentage_used: 84.0,
    });
    let json = serde_json::to_value(&alert).unwrap();
    assert_eq!(json["type"], "budget_alert");
    assert_eq!(json["window"], "daily");
    assert_eq!(json["percentage_used"], 84.0);
}
