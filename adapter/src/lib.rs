pub mod database;
pub mod mailer;
pub mod queue;
pub mod repository;
