use crate::model::{
    id::UserId,
    subscription::{
        event::{CreateSubscription, DeleteSubscription},
        Subscription,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Creates a subscription after the scheduling rules pass; the whole
    /// read-decide-write sequence is serialized against concurrent calls.
    async fn create(
        &self,
        event: CreateSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription>;
    async fn delete(&self, event: DeleteSubscription, now: DateTime<Utc>) -> AppResult<()>;
    /// The user's live subscriptions to meetups that have not yet happened,
    /// ordered by meetup date.
    async fn find_live_by_user_id(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Subscription>>;
}
