pub mod category;
pub mod common;
pub mod compilation;
pub mod event;
pub mod request;
pub mod user;
