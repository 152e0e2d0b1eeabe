pub mod category;
pub mod compilation;
pub mod event;
pub mod rating;
pub mod request;
pub mod user;
