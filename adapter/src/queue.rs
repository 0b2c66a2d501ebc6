//! Durable notification queue backed by the `notifications` table.
//!
//! `dequeue` uses `FOR UPDATE SKIP LOCKED` so several workers never hand
//! out the same job twice. Retry scheduling doubles the interval per
//! attempt; once the attempt budget is spent the row is parked as `failed`
//! and reported at error level so operators see it.

use crate::database::{model::notification::NotificationRow, ConnectionPool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use kernel::model::id::NotificationId;
use kernel::notification::{
    NotificationQueue, QueuedJob, SubscriptionConfirmed, SUBSCRIPTION_CONFIRMED_KIND,
};
use shared::{
    config::QueueConfig,
    error::{AppError, AppResult},
};

#[derive(new)]
pub struct PgNotificationQueue {
    db: ConnectionPool,
    config: QueueConfig,
}

#[async_trait]
impl NotificationQueue for PgNotificationQueue {
    async fn enqueue(
        &self,
        job: SubscriptionConfirmed,
        now: DateTime<Utc>,
    ) -> AppResult<NotificationId> {
        let notification_id = NotificationId::new();
        let payload = serde_json::to_value(&job)
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;

        sqlx::query(
            r#"
                INSERT INTO notifications
                (notification_id, kind, payload, status, attempts, next_attempt_at, created_at)
                VALUES ($1, $2, $3, 'pending', 0, $4, $4)
                ;
            "#,
        )
        .bind(notification_id)
        .bind(SUBSCRIPTION_CONFIRMED_KIND)
        .bind(payload)
        .bind(now)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(notification_id)
    }

    async fn dequeue(&self, now: DateTime<Utc>) -> AppResult<Option<QueuedJob>> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
                SELECT notification_id, attempts, payload
                FROM notifications
                WHERE status = 'pending'
                AND next_attempt_at <= $1
                ORDER BY created_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
                ;
            "#,
        )
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            tx.commit().await.map_err(AppError::TransactionError)?;
            return Ok(None);
        };

        sqlx::query(
            r#"
                UPDATE notifications
                SET attempts = attempts + 1
                WHERE notification_id = $1
                ;
            "#,
        )
        .bind(row.notification_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        // A payload that no longer decodes can never be delivered; park it
        // instead of handing the row out (or erroring) on every poll.
        let job: SubscriptionConfirmed = match serde_json::from_value(row.payload) {
            Ok(job) => job,
            Err(e) => {
                sqlx::query(
                    r#"
                        UPDATE notifications
                        SET status = 'failed', last_error = $2
                        WHERE notification_id = $1
                        ;
                    "#,
                )
                .bind(row.notification_id)
                .bind(e.to_string())
                .execute(self.db.inner_ref())
                .await
                .map_err(AppError::SpecificOperationError)?;

                tracing::error!(
                    notification_id = %row.notification_id,
                    error.message = %e,
                    "notification payload could not be decoded, giving up"
                );
                return Ok(None);
            }
        };

        Ok(Some(QueuedJob {
            notification_id: row.notification_id,
            attempts: row.attempts + 1,
            job,
        }))
    }

    async fn mark_delivered(&self, notification_id: NotificationId) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE notifications
                SET status = 'delivered'
                WHERE notification_id = $1
                ;
            "#,
        )
        .bind(notification_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "notification ({notification_id}) was not found"
            )));
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        notification_id: NotificationId,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let attempts: i32 = sqlx::query_scalar(
            r#"
                SELECT attempts FROM notifications WHERE notification_id = $1;
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("notification ({notification_id}) was not found"))
        })?;

        if attempts >= self.config.max_attempts {
            sqlx::query(
                r#"
                    UPDATE notifications
                    SET status = 'failed', last_error = $2
                    WHERE notification_id = $1
                    ;
                "#,
            )
            .bind(notification_id)
            .bind(error)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            tracing::error!(
                notification_id = %notification_id,
                attempts,
                error.message = %error,
                "notification permanently failed, giving up"
            );
        } else {
            // exponential backoff: interval * 2^(attempts - 1)
            let exponent = (attempts - 1).clamp(0, 16) as u32;
            let backoff_secs = self.config.retry_interval_secs as i64 * (1i64 << exponent);

            sqlx::query(
                r#"
                    UPDATE notifications
                    SET next_attempt_at = $2, last_error = $3
                    WHERE notification_id = $1
                    ;
                "#,
            )
            .bind(notification_id)
            .bind(now + Duration::seconds(backoff_secs))
            .bind(error)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::id::{MeetupId, UserId};
    use kernel::notification::{NotifiedMeetup, NotifiedParty};

    fn job() -> SubscriptionConfirmed {
        SubscriptionConfirmed {
            meetup: NotifiedMeetup {
                meetup_id: MeetupId::new(),
                title: "Rust meetup".into(),
                date: Utc::now(),
            },
            organizer: NotifiedParty {
                user_id: UserId::new(),
                user_name: "Olivia".into(),
                email: "olivia@example.com".into(),
            },
            subscriber: NotifiedParty {
                user_id: UserId::new(),
                user_name: "Sam".into(),
                email: "sam@example.com".into(),
            },
        }
    }

    fn config() -> QueueConfig {
        QueueConfig {
            max_attempts: 2,
            retry_interval_secs: 1,
            poll_interval_secs: 1,
        }
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn enqueue_dequeue_ack_roundtrip(pool: sqlx::PgPool) {
        let queue = PgNotificationQueue::new(ConnectionPool::new(pool), config());
        let now = Utc::now();

        let id = queue.enqueue(job(), now).await.unwrap();

        let queued = queue.dequeue(now).await.unwrap().unwrap();
        assert_eq!(queued.notification_id, id);
        assert_eq!(queued.attempts, 1);

        queue.mark_delivered(id).await.unwrap();
        assert!(queue.dequeue(now).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn undecodable_payloads_are_parked_as_failed(pool: sqlx::PgPool) {
        let queue = PgNotificationQueue::new(ConnectionPool::new(pool.clone()), config());
        let now = Utc::now();

        let id = NotificationId::new();
        sqlx::query(
            r#"
                INSERT INTO notifications
                (notification_id, kind, payload, status, attempts, next_attempt_at, created_at)
                VALUES ($1, $2, $3, 'pending', 0, $4, $4)
                ;
            "#,
        )
        .bind(id)
        .bind(SUBSCRIPTION_CONFIRMED_KIND)
        .bind(serde_json::json!({"not": "a subscription"}))
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();

        assert!(queue.dequeue(now).await.unwrap().is_none());

        let status: String =
            sqlx::query_scalar("SELECT status FROM notifications WHERE notification_id = $1")
                .bind(id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "failed");

        // the parked row stays out of the queue
        assert!(queue
            .dequeue(now + Duration::seconds(60))
            .await
            .unwrap()
            .is_none());
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn exhausted_retries_park_the_job_as_failed(pool: sqlx::PgPool) {
        let queue = PgNotificationQueue::new(ConnectionPool::new(pool), config());
        let now = Utc::now();

        let id = queue.enqueue(job(), now).await.unwrap();

        // first failure reschedules
        queue.dequeue(now).await.unwrap().unwrap();
        queue.mark_failed(id, "smtp down", now).await.unwrap();
        let later = now + Duration::seconds(10);
        assert!(queue.dequeue(later).await.unwrap().is_some());

        // second failure exhausts max_attempts = 2
        queue.mark_failed(id, "smtp down", later).await.unwrap();
        assert!(queue
            .dequeue(later + Duration::seconds(60))
            .await
            .unwrap()
            .is_none());
    }
}
