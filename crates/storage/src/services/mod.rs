pub mod event_lifecycle;
pub mod participation;
pub mod rating_aggregation;
pub mod user_removal;
