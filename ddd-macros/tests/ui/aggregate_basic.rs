use ddd_domain::aggregate::{Aggregate, HasDomainEvents};
use ddd_domain::domain_event::DomainEvents;
use ddd_domain::entity::Entity;
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::value_object::EntityIdentity;
use ddd_macros::{aggregate, domain_event};

#[domain_event]
struct Opened {
    owner: String,
}

#[aggregate]
struct Account {
    owner: String,
    balance: i64,
}

impl Aggregate for Account {
    fn assert_valid(&self) -> DomainResult<()> {
        if self.balance < 0 {
            return Err(DomainError::invalid_state("balance cannot be negative"));
        }
        Ok(())
    }
}

fn main() {
    let id = EntityIdentity::random();
    let mut account = Account {
        id,
        owner: "alice".to_string(),
        balance: 0,
        domain_events: DomainEvents::default(),
    };
    account.record_event(Opened {
        owner: account.owner.clone(),
    });

    assert_eq!(account.id(), id);
    assert_eq!(account.domain_events().len(), 1);
    assert!(account.assert_valid().is_ok());
    let _ = format!("{:?}", account);
}
