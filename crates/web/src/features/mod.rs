pub mod categories;
pub mod compilations;
pub mod events;
pub mod ratings;
pub mod requests;
pub mod users;
