use chrono::{DateTime, Utc};
use kernel::model::{
    id::{ImageId, MeetupId, UserId},
    meetup::{Meetup, MeetupOrganizer},
};

/// A meetup joined with its organizer's user row.
#[derive(sqlx::FromRow)]
pub struct MeetupRow {
    pub meetup_id: MeetupId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image_id: ImageId,
    pub organizer_id: UserId,
    pub organizer_name: String,
    pub organizer_email: String,
}

impl From<MeetupRow> for Meetup {
    fn from(value: MeetupRow) -> Self {
        let MeetupRow {
            meetup_id,
            title,
            description,
            location,
            date,
            image_id,
            organizer_id,
            organizer_name,
            organizer_email,
        } = value;
        Meetup {
            meetup_id,
            title,
            description,
            location,
            date,
            image_id,
            organizer: MeetupOrganizer {
                user_id: organizer_id,
                user_name: organizer_name,
                email: organizer_email,
            },
        }
    }
}
