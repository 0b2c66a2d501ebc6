//! Subscription notification contract.
//!
//! The lifecycle layer only enqueues; a worker loop drains the queue and
//! hands rendered mails to the sender. Retry policy lives behind the
//! [`NotificationQueue`] implementation, so a permanently failing mail
//! collaborator surfaces as failed jobs, never as an error to the caller
//! who subscribed.

use crate::model::id::{MeetupId, NotificationId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::AppResult;

/// Job kind discriminator stored alongside the payload.
pub const SUBSCRIPTION_CONFIRMED_KIND: &str = "subscription_confirmed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfirmed {
    pub meetup: NotifiedMeetup,
    pub organizer: NotifiedParty,
    pub subscriber: NotifiedParty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedMeetup {
    pub meetup_id: MeetupId,
    pub title: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedParty {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}

impl SubscriptionConfirmed {
    /// Formats the mail sent to the organizer.
    pub fn render(&self) -> Email {
        let date = self.meetup.date.format("%B %-d, %Y at %H:%M");
        Email {
            to_name: self.organizer.user_name.clone(),
            to_email: self.organizer.email.clone(),
            subject: format!("New subscription: {}", self.meetup.title),
            body: format!(
                "Hi {},\n\n\
                 {} <{}> subscribed to \"{}\" on {}.\n",
                self.organizer.user_name,
                self.subscriber.user_name,
                self.subscriber.email,
                self.meetup.title,
                date,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: Email) -> AppResult<()>;
}

/// A job handed back to the worker, with the attempt counter after dequeue.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub notification_id: NotificationId,
    pub attempts: i32,
    pub job: SubscriptionConfirmed,
}

#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Durably records the job and returns without waiting for delivery.
    async fn enqueue(
        &self,
        job: SubscriptionConfirmed,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationId>;

    /// Hands out at most one due job, bumping its attempt counter.
    async fn dequeue(&self, now: DateTime<Utc>) -> AppResult<Option<QueuedJob>>;

    async fn mark_delivered(&self, notification_id: NotificationId) -> AppResult<()>;

    /// Schedules a retry, or parks the job as failed once the policy's
    /// attempt budget is spent.
    async fn mark_failed(
        &self,
        notification_id: NotificationId,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// One worker step: deliver at most one due job. Returns `false` when the
/// queue had nothing due, so the caller knows it can sleep.
pub async fn deliver_next(
    queue: &dyn NotificationQueue,
    mailer: &dyn MailSender,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    let Some(queued) = queue.dequeue(now).await? else {
        return Ok(false);
    };

    let email = queued.job.render();
    match mailer.send(email).await {
        Ok(()) => {
            queue.mark_delivered(queued.notification_id).await?;
            tracing::info!(
                notification_id = %queued.notification_id,
                attempts = queued.attempts,
                "subscription notification delivered"
            );
        }
        Err(e) => {
            tracing::warn!(
                notification_id = %queued.notification_id,
                attempts = queued.attempts,
                error.message = %e,
                "subscription notification delivery failed"
            );
            queue
                .mark_failed(queued.notification_id, &e.to_string(), now)
                .await?;
        }
    }
    Ok(true)
}
