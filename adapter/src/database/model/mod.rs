pub mod meetup;
pub mod notification;
pub mod subscription;
pub mod user;
