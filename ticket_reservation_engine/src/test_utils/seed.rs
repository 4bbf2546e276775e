use trs_common::Money;

use crate::{
    db_types::{NewSeat, NewShow, Show, ShowId},
    traits::SeatInventory,
    SqliteDatabase,
};

/// Provisions a show with `n_seats` seats in a single row of the Stalls, numbered from 1, all at `price`.
pub async fn seed_show(db: &SqliteDatabase, show_id: &str, n_seats: i64, price: Money) -> Show {
    let show = NewShow::new(ShowId::from(show_id), format!("Test show {show_id}"), "Test venue".to_string());
    let seats = (1..=n_seats).map(|n| NewSeat::new("Stalls", "A", n, price)).collect();
    db.provision_show(show, seats).await.expect("Error seeding show")
}
