use ddd_domain::domain_event::DomainEvent;
use ddd_macros::domain_event;

#[domain_event]
struct OrderShipped {
    order_id: String,
}

#[domain_event(event_type = "order.cancelled")]
struct OrderCancelled;

#[domain_event]
struct Tagged(String, u32);

#[domain_event]
enum PaymentEvent {
    Authorized { amount: u64 },
    Captured(u64),
    #[event(event_type = "payment.voided")]
    Voided,
}

fn main() {
    let shipped = OrderShipped {
        order_id: "o-1".to_string(),
    };
    assert_eq!(shipped.event_type(), "OrderShipped");
    assert_eq!(shipped.clone(), shipped);

    assert_eq!(OrderCancelled.event_type(), "order.cancelled");
    assert_eq!(Tagged("x".to_string(), 1).event_type(), "Tagged");

    assert_eq!(
        PaymentEvent::Authorized { amount: 5 }.event_type(),
        "PaymentEvent.Authorized"
    );
    assert_eq!(PaymentEvent::Captured(5).event_type(), "PaymentEvent.Captured");
    assert_eq!(PaymentEvent::Voided.event_type(), "payment.voided");

    // 以 trait object 形式还原具体类型
    let boxed: Box<dyn DomainEvent> = Box::new(shipped);
    assert!(boxed.is::<OrderShipped>());
    assert_eq!(boxed.downcast_ref::<OrderShipped>().unwrap().order_id, "o-1");
    let _ = format!("{:?}", boxed);
}
