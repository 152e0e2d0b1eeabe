pub mod category;
pub mod compilation;
pub mod event;
pub mod location;
pub mod rating;
pub mod request;
pub mod user;

pub use category::Category;
pub use compilation::Compilation;
pub use event::{AdminStateAction, Event, EventState, EventView, UserStateAction};
pub use location::Location;
pub use rating::Rating;
pub use request::{ParticipationRequest, RequestStatus};
pub use user::User;
