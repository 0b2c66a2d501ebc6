use crate::model::id::{ImageId, MeetupId, UserId};
use chrono::{DateTime, Utc};
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateMeetup {
    pub organizer_id: UserId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image_id: ImageId,
}

#[derive(Debug)]
pub struct UpdateMeetup {
    pub meetup_id: MeetupId,
    pub requested_user: UserId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub image_id: Option<ImageId>,
}

#[derive(Debug, new)]
pub struct DeleteMeetup {
    pub meetup_id: MeetupId,
    pub requested_user: UserId,
}
