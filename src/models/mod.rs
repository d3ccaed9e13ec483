pub mod meeting;
pub mod notification;
pub mod room;
pub mod user;
