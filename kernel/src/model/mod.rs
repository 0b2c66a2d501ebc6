pub mod id;
pub mod meetup;
pub mod subscription;
pub mod user;
