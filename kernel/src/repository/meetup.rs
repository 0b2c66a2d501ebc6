use crate::model::{
    id::{MeetupId, UserId},
    meetup::{
        event::{CreateMeetup, DeleteMeetup, UpdateMeetup},
        Meetup,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::error::AppResult;

/// Meetup lifecycle. Every mutating method receives the caller's `now` and
/// runs its read-decide-write sequence as one atomic unit.
#[async_trait]
pub trait MeetupRepository: Send + Sync {
    async fn create(&self, event: CreateMeetup, now: DateTime<Utc>) -> AppResult<Meetup>;
    /// Applies the patch all-or-nothing; a patched date is re-validated
    /// against the past-date rule.
    async fn update(&self, event: UpdateMeetup, now: DateTime<Utc>) -> AppResult<Meetup>;
    /// Removes the meetup and voids its live subscriptions.
    async fn delete(&self, event: DeleteMeetup, now: DateTime<Utc>) -> AppResult<()>;
    async fn find_by_id(&self, meetup_id: MeetupId) -> AppResult<Option<Meetup>>;
    /// Meetups within the given calendar day the subscriber neither
    /// organizes nor has subscribed to, ordered by date, paginated.
    async fn find_available_on(
        &self,
        day: NaiveDate,
        excluding_subscriber: UserId,
        page: i64,
    ) -> AppResult<Vec<Meetup>>;
    async fn find_by_organizer(&self, organizer_id: UserId) -> AppResult<Vec<Meetup>>;
}
