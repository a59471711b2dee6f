pub mod config;
pub mod logging;

pub mod chain;
pub mod hash_queue;
pub mod reservation;
pub mod reservations;
pub mod simulate;
