use ddd_domain::entity::Entity;
use ddd_domain::value_object::EntityIdentity;
use ddd_macros::entity;

#[entity]
#[derive(Clone)]
struct Inventory {
    quantity: u32,
}

// 已声明的 id 字段会被移至最前
#[entity(debug = false)]
struct Product {
    name: String,
    id: EntityIdentity,
}

impl std::fmt::Debug for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Product({})", self.name)
    }
}

fn main() {
    let id = EntityIdentity::random();
    let inventory = Inventory { id, quantity: 3 };
    assert_eq!(inventory.id(), id);
    assert_eq!(inventory.clone().quantity, 3);
    let _ = format!("{:?}", inventory);

    let product = Product {
        id: EntityIdentity::random(),
        name: "pen".to_string(),
    };
    assert_eq!(format!("{:?}", product), "Product(pen)");
}
