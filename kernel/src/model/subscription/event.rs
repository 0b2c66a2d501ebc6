use crate::model::id::{MeetupId, SubscriptionId, UserId};
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateSubscription {
    pub meetup_id: MeetupId,
    pub user_id: UserId,
}

#[derive(Debug, new)]
pub struct DeleteSubscription {
    pub subscription_id: SubscriptionId,
    pub requested_user: UserId,
}
