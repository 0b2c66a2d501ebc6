pub mod clock;
pub mod conflict;
pub mod model;
pub mod notification;
pub mod repository;
