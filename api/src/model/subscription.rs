use chrono::{DateTime, Utc};
use kernel::model::{
    id::{MeetupId, SubscriptionId, UserId},
    subscription::{Subscription, SubscriptionMeetup},
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionsResponse {
    pub items: Vec<SubscriptionResponse>,
}

impl From<Vec<Subscription>> for SubscriptionsResponse {
    fn from(value: Vec<Subscription>) -> Self {
        Self {
            items: value.into_iter().map(SubscriptionResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub meetup: SubscriptionMeetupResponse,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(value: Subscription) -> Self {
        let Subscription {
            subscription_id,
            user_id,
            created_at,
            meetup,
        } = value;
        Self {
            subscription_id,
            user_id,
            created_at,
            meetup: meetup.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionMeetupResponse {
    pub meetup_id: MeetupId,
    pub title: String,
    pub location: String,
    pub date: DateTime<Utc>,
}

impl From<SubscriptionMeetup> for SubscriptionMeetupResponse {
    fn from(value: SubscriptionMeetup) -> Self {
        let SubscriptionMeetup {
            meetup_id,
            title,
            location,
            date,
        } = value;
        Self {
            meetup_id,
            title,
            location,
            date,
        }
    }
}
