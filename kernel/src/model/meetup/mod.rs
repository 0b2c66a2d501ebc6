use crate::model::id::{ImageId, MeetupId, UserId};
use chrono::{DateTime, Utc};

pub mod event;

#[derive(Debug, Clone)]
pub struct Meetup {
    pub meetup_id: MeetupId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image_id: ImageId,
    pub organizer: MeetupOrganizer,
}

#[derive(Debug, Clone)]
pub struct MeetupOrganizer {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}
