use chrono::{DateTime, Utc};
use kernel::conflict::HeldSlot;
use kernel::model::{
    id::{MeetupId, SubscriptionId, UserId},
    subscription::{Subscription, SubscriptionMeetup},
};

/// A subscription joined with its meetup.
#[derive(sqlx::FromRow)]
pub struct SubscriptionRow {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub meetup_id: MeetupId,
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(value: SubscriptionRow) -> Self {
        let SubscriptionRow {
            subscription_id,
            user_id,
            created_at,
            meetup_id,
            title,
            location,
            date,
        } = value;
        Subscription {
            subscription_id,
            user_id,
            created_at,
            meetup: SubscriptionMeetup {
                meetup_id,
                title,
                location,
                date,
            },
        }
    }
}

/// The slice of a live subscription the subscribe check needs.
#[derive(sqlx::FromRow)]
pub struct HeldSlotRow {
    pub meetup_id: MeetupId,
    pub date: DateTime<Utc>,
}

impl From<HeldSlotRow> for HeldSlot {
    fn from(value: HeldSlotRow) -> Self {
        HeldSlot {
            meetup_id: value.meetup_id,
            date: value.date,
        }
    }
}
