pub mod meetup;
pub mod subscription;
