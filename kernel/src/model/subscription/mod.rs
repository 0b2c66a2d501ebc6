use crate::model::id::{MeetupId, SubscriptionId, UserId};
use chrono::{DateTime, Utc};

pub mod event;

#[derive(Debug, Clone)]
pub struct Subscription {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub meetup: SubscriptionMeetup,
}

#[derive(Debug, Clone)]
pub struct SubscriptionMeetup {
    pub meetup_id: MeetupId,
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
}
