//! PostgreSQL repositories implementing the store read traits.

pub mod order_repo;
pub mod tick_repo;

pub use order_repo::OrderRepository;
pub use tick_repo::TickRepository;

use crate::database::DatabaseClient;

/// Creates all repositories from a single client.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub ticks: TickRepository,
    pub orders: OrderRepository,
}

impl Repositories {
    #[must_use]
    pub fn new(client: &DatabaseClient) -> Self {
        Self {
            ticks: TickRepository::new(client),
            orders: OrderRepository::new(client),
        }
    }
}
