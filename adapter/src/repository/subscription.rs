use crate::database::{
    model::{
        meetup::MeetupRow,
        subscription::{HeldSlotRow, SubscriptionRow},
    },
    set_transaction_serializable, ConnectionPool,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_new::new;
use kernel::conflict::{self, HeldSlot};
use kernel::model::{
    id::{SubscriptionId, UserId},
    meetup::Meetup,
    subscription::{
        event::{CreateSubscription, DeleteSubscription},
        Subscription, SubscriptionMeetup,
    },
};
use kernel::repository::subscription::SubscriptionRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct SubscriptionRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl SubscriptionRepository for SubscriptionRepositoryImpl {
    async fn create(
        &self,
        event: CreateSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let mut tx = self.db.begin().await?;

        // Two concurrent subscribe calls must not both pass the checks
        // before either commits; SERIALIZABLE makes the loser retry-able.
        set_transaction_serializable(&mut tx).await?;

        let row = sqlx::query_as::<_, MeetupRow>(
            r#"
                SELECT
                m.meetup_id,
                m.title,
                m.description,
                m.location,
                m.date,
                m.image_id,
                u.user_id AS organizer_id,
                u.user_name AS organizer_name,
                u.email AS organizer_email
                FROM meetups AS m
                INNER JOIN users AS u ON m.organizer_id = u.user_id
                WHERE m.meetup_id = $1
                ;
            "#,
        )
        .bind(event.meetup_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "meetup ({}) was not found",
                event.meetup_id
            )));
        };
        let meetup = Meetup::from(row);

        let held: Vec<HeldSlot> = sqlx::query_as::<_, HeldSlotRow>(
            r#"
                SELECT
                s.meetup_id,
                m.date
                FROM subscriptions AS s
                INNER JOIN meetups AS m ON s.meetup_id = m.meetup_id
                WHERE s.user_id = $1
                ;
            "#,
        )
        .bind(event.user_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(HeldSlot::from)
        .collect();

        conflict::can_subscribe(&meetup, event.user_id, &held, now)?;

        let subscription_id = SubscriptionId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO subscriptions
                (subscription_id, user_id, meetup_id, created_at)
                VALUES ($1, $2, $3, $4)
                ;
            "#,
        )
        .bind(subscription_id)
        .bind(event.user_id)
        .bind(event.meetup_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No subscription record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(Subscription {
            subscription_id,
            user_id: event.user_id,
            created_at: now,
            meetup: SubscriptionMeetup {
                meetup_id: meetup.meetup_id,
                title: meetup.title,
                location: meetup.location,
                date: meetup.date,
            },
        })
    }

    async fn delete(&self, event: DeleteSubscription, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        set_transaction_serializable(&mut tx).await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
                SELECT
                s.subscription_id,
                s.user_id,
                s.created_at,
                m.meetup_id,
                m.title,
                m.location,
                m.date
                FROM subscriptions AS s
                INNER JOIN meetups AS m ON s.meetup_id = m.meetup_id
                WHERE s.subscription_id = $1
                ;
            "#,
        )
        .bind(event.subscription_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "subscription ({}) was not found",
                event.subscription_id
            )));
        };
        let subscription = Subscription::from(row);

        conflict::can_unsubscribe(&subscription, event.requested_user, now)?;

        let res = sqlx::query(
            r#"
                DELETE FROM subscriptions WHERE subscription_id = $1;
            "#,
        )
        .bind(event.subscription_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No subscription record has been deleted".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    async fn find_live_by_user_id(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, SubscriptionRow>(
            r#"
                SELECT
                s.subscription_id,
                s.user_id,
                s.created_at,
                m.meetup_id,
                m.title,
                m.location,
                m.date
                FROM subscriptions AS s
                INNER JOIN meetups AS m ON s.meetup_id = m.meetup_id
                WHERE s.user_id = $1
                AND m.date >= $2
                ORDER BY m.date ASC
                ;
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Subscription::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kernel::model::id::ImageId;
    use kernel::model::meetup::event::CreateMeetup;
    use kernel::repository::meetup::MeetupRepository;

    use crate::repository::meetup::MeetupRepositoryImpl;

    async fn seed_user(pool: &sqlx::PgPool, name: &str, email: &str) -> UserId {
        let user_id = UserId::new();
        sqlx::query("INSERT INTO users (user_id, user_name, email) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(name)
            .bind(email)
            .execute(pool)
            .await
            .unwrap();
        user_id
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn second_subscribe_to_the_same_meetup_is_denied(pool: sqlx::PgPool) {
        let meetups = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let subscriptions = SubscriptionRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let attendee = seed_user(&pool, "Sam", "sam@example.com").await;
        let now = Utc::now();

        let meetup = meetups
            .create(
                CreateMeetup::new(
                    organizer,
                    "Rust meetup".into(),
                    "Monthly get-together".into(),
                    "Main street 1".into(),
                    now + Duration::hours(2),
                    ImageId::new(),
                ),
                now,
            )
            .await
            .unwrap();

        let first = subscriptions
            .create(CreateSubscription::new(meetup.meetup_id, attendee), now)
            .await
            .unwrap();
        assert_eq!(first.meetup.meetup_id, meetup.meetup_id);

        let second = subscriptions
            .create(CreateSubscription::new(meetup.meetup_id, attendee), now)
            .await;
        assert!(matches!(second, Err(AppError::UnprocessableEntity(_))));

        let live = subscriptions
            .find_live_by_user_id(attendee, now)
            .await
            .unwrap();
        assert_eq!(live.len(), 1);
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn concurrent_subscribes_to_the_same_instant_commit_at_most_once(pool: sqlx::PgPool) {
        let meetups = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let subscriptions = SubscriptionRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let attendee = seed_user(&pool, "Sam", "sam@example.com").await;
        let now = Utc::now();
        let date = now + Duration::hours(2);

        let first = meetups
            .create(
                CreateMeetup::new(
                    organizer,
                    "Rust meetup".into(),
                    "Monthly get-together".into(),
                    "Main street 1".into(),
                    date,
                    ImageId::new(),
                ),
                now,
            )
            .await
            .unwrap();
        let second = meetups
            .create(
                CreateMeetup::new(
                    organizer,
                    "Go meetup".into(),
                    "Monthly get-together".into(),
                    "Main street 2".into(),
                    date,
                    ImageId::new(),
                ),
                now,
            )
            .await
            .unwrap();

        // Both checks read an empty slot set; under SERIALIZABLE the
        // overlapping writes must not both commit.
        let (a, b) = tokio::join!(
            subscriptions.create(CreateSubscription::new(first.meetup_id, attendee), now),
            subscriptions.create(CreateSubscription::new(second.meetup_id, attendee), now),
        );

        let committed = [&a, &b].iter().filter(|res| res.is_ok()).count();
        assert!(committed <= 1, "both overlapping subscriptions committed");
        for res in [a, b] {
            if let Err(e) = res {
                // either an outright denial or a serialization failure
                // the caller may retry
                assert!(matches!(
                    e,
                    AppError::UnprocessableEntity(_)
                        | AppError::SpecificOperationError(_)
                        | AppError::TransactionError(_)
                ));
            }
        }

        let live = subscriptions
            .find_live_by_user_id(attendee, now)
            .await
            .unwrap();
        assert!(live.len() <= 1);
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn deleting_a_meetup_voids_its_subscriptions(pool: sqlx::PgPool) {
        let meetups = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let subscriptions = SubscriptionRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let attendee = seed_user(&pool, "Sam", "sam@example.com").await;
        let now = Utc::now();

        let meetup = meetups
            .create(
                CreateMeetup::new(
                    organizer,
                    "Rust meetup".into(),
                    "Monthly get-together".into(),
                    "Main street 1".into(),
                    now + Duration::hours(2),
                    ImageId::new(),
                ),
                now,
            )
            .await
            .unwrap();
        subscriptions
            .create(CreateSubscription::new(meetup.meetup_id, attendee), now)
            .await
            .unwrap();

        meetups
            .delete(
                kernel::model::meetup::event::DeleteMeetup::new(meetup.meetup_id, organizer),
                now,
            )
            .await
            .unwrap();

        let live = subscriptions
            .find_live_by_user_id(attendee, now)
            .await
            .unwrap();
        assert!(live.is_empty());
    }
}
