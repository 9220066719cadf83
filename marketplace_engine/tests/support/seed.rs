use marketplace_engine::{
    db_types::{NewRfq, Role, Supplier, User},
    traits::AuthManagement,
    SqliteDatabase,
};
use tms_common::Money;

/// The cast of characters most settlement tests need: one buyer and two independent suppliers.
pub struct Parties {
    pub buyer: User,
    pub supplier_a: Supplier,
    pub supplier_a_user: User,
    pub supplier_b: Supplier,
    pub supplier_b_user: User,
}

pub async fn seed_user(db: &SqliteDatabase, username: &str, api_key: &str) -> User {
    db.create_user(username, api_key).await.expect("Error seeding user")
}

pub async fn seed_supplier(db: &SqliteDatabase, user_id: i64, company_name: &str) -> Supplier {
    db.create_supplier(user_id, company_name).await.expect("Error seeding supplier")
}

pub async fn seed_parties(db: &SqliteDatabase) -> Parties {
    let buyer = seed_user(db, "alice", "alice-key").await;
    db.assign_roles(buyer.id, &[Role::User, Role::Buyer]).await.expect("Error assigning buyer roles");
    let supplier_a_user = seed_user(db, "bob", "bob-key").await;
    db.assign_roles(supplier_a_user.id, &[Role::User, Role::Supplier]).await.expect("Error assigning roles");
    let supplier_a = seed_supplier(db, supplier_a_user.id, "Bob's Widgets").await;
    let supplier_b_user = seed_user(db, "carol", "carol-key").await;
    db.assign_roles(supplier_b_user.id, &[Role::User, Role::Supplier]).await.expect("Error assigning roles");
    let supplier_b = seed_supplier(db, supplier_b_user.id, "Carol & Co").await;
    Parties { buyer, supplier_a, supplier_a_user, supplier_b, supplier_b_user }
}

/// A plain RFQ for 5000.00 owned by the given buyer.
pub fn widget_rfq(buyer_id: i64) -> NewRfq {
    NewRfq::new(buyer_id, "500 industrial widgets", Money::from_units(5000))
}
