pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemorySeatStore;
pub use postgres::PostgresSeatStore;
pub use store::{DEFAULT_LOCK_TIMEOUT, SeatStore, StoreTransaction, TransactionOptions};
