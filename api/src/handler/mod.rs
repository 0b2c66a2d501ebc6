pub mod health;
pub mod meetup;
pub mod subscription;
