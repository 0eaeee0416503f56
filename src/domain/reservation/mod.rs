pub mod engine;
pub mod reservation;
pub mod reservation_store;
