pub mod geo;
pub mod ledger;
pub mod node;
pub mod reservation;
pub mod utils;
