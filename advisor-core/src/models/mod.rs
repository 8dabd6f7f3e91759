pub mod message;
pub mod recommendation;
pub mod user;

pub use message::{ChatMessage, Message, Role};
pub use recommendation::{RecommendationRow, RecommendationTable, ALL_CATEGORIES, CATEGORY_FILTERS};
pub use user::User;
