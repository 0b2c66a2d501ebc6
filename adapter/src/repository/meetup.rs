use crate::database::{model::meetup::MeetupRow, set_transaction_serializable, ConnectionPool};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use derive_new::new;
use kernel::conflict;
use kernel::model::{
    id::{MeetupId, UserId},
    meetup::{
        event::{CreateMeetup, DeleteMeetup, UpdateMeetup},
        Meetup,
    },
};
use kernel::repository::meetup::MeetupRepository;
use shared::error::{AppError, AppResult};

const PAGE_SIZE: i64 = 10;

#[derive(new)]
pub struct MeetupRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl MeetupRepository for MeetupRepositoryImpl {
    async fn create(&self, event: CreateMeetup, now: DateTime<Utc>) -> AppResult<Meetup> {
        conflict::can_create_meetup(event.date, now)?;

        let mut tx = self.db.begin().await?;

        let meetup_id = MeetupId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO meetups
                (meetup_id, organizer_id, title, description, location, date, image_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ;
            "#,
        )
        .bind(meetup_id)
        .bind(event.organizer_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(event.image_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No meetup record has been created".into(),
            ));
        }

        // the organizer row must resolve; identity is owned upstream
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
        .bind(meetup_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(row.into())
    }

    async fn update(&self, event: UpdateMeetup, now: DateTime<Utc>) -> AppResult<Meetup> {
        let mut tx = self.db.begin().await?;
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

        conflict::can_mutate_meetup(&meetup, event.requested_user, now)?;
        if let Some(new_date) = event.date {
            conflict::can_create_meetup(new_date, now)?;
        }

        let res = sqlx::query(
            r#"
                UPDATE meetups
                SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    location = COALESCE($4, location),
                    date = COALESCE($5, date),
                    image_id = COALESCE($6, image_id)
                WHERE meetup_id = $1
                ;
            "#,
        )
        .bind(event.meetup_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(event.image_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No meetup record has been updated".into(),
            ));
        }

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
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(row.into())
    }

    async fn delete(&self, event: DeleteMeetup, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
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

        conflict::can_mutate_meetup(&meetup, event.requested_user, now)?;

        // cancelling a meetup voids its live subscriptions
        sqlx::query(
            r#"
                DELETE FROM subscriptions WHERE meetup_id = $1;
            "#,
        )
        .bind(event.meetup_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let res = sqlx::query(
            r#"
                DELETE FROM meetups WHERE meetup_id = $1;
            "#,
        )
        .bind(event.meetup_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No meetup record has been deleted".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    async fn find_by_id(&self, meetup_id: MeetupId) -> AppResult<Option<Meetup>> {
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
        .bind(meetup_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Meetup::from))
    }

    async fn find_available_on(
        &self,
        day: NaiveDate,
        excluding_subscriber: UserId,
        page: i64,
    ) -> AppResult<Vec<Meetup>> {
        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let offset = (page - 1) * PAGE_SIZE;

        sqlx::query_as::<_, MeetupRow>(
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
                WHERE m.date >= $1
                AND m.date < $2
                AND m.organizer_id <> $3
                AND NOT EXISTS (
                    SELECT 1
                    FROM subscriptions AS s
                    WHERE s.meetup_id = m.meetup_id
                    AND s.user_id = $3
                )
                ORDER BY m.date ASC
                LIMIT $4 OFFSET $5
                ;
            "#,
        )
        .bind(day_start)
        .bind(day_end)
        .bind(excluding_subscriber)
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Meetup::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_by_organizer(&self, organizer_id: UserId) -> AppResult<Vec<Meetup>> {
        sqlx::query_as::<_, MeetupRow>(
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
                WHERE m.organizer_id = $1
                ORDER BY m.date ASC
                ;
            "#,
        )
        .bind(organizer_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Meetup::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::id::ImageId;

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
    async fn create_then_update_and_delete(pool: sqlx::PgPool) {
        let repo = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let now = Utc::now();

        let created = repo
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
        assert_eq!(created.organizer.user_id, organizer);

        let updated = repo
            .update(
                UpdateMeetup {
                    meetup_id: created.meetup_id,
                    requested_user: organizer,
                    title: Some("Rust meetup, room B".into()),
                    description: None,
                    location: None,
                    date: None,
                    image_id: None,
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rust meetup, room B");
        assert_eq!(updated.description, created.description);

        repo.delete(DeleteMeetup::new(created.meetup_id, organizer), now)
            .await
            .unwrap();
        assert!(repo.find_by_id(created.meetup_id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn available_listing_skips_own_and_subscribed_meetups(pool: sqlx::PgPool) {
        let repo = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let attendee = seed_user(&pool, "Sam", "sam@example.com").await;
        let now = Utc::now();
        let date = now + Duration::days(1);

        let theirs = repo
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
        let mine = repo
            .create(
                CreateMeetup::new(
                    attendee,
                    "Board games night".into(),
                    "Bring your own deck".into(),
                    "Main street 2".into(),
                    date,
                    ImageId::new(),
                ),
                now,
            )
            .await
            .unwrap();

        // the attendee's own meetup never shows up in their listing
        let available = repo
            .find_available_on(date.date_naive(), attendee, 1)
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].meetup_id, theirs.meetup_id);
        assert_ne!(available[0].meetup_id, mine.meetup_id);

        sqlx::query(
            "INSERT INTO subscriptions (subscription_id, user_id, meetup_id, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(kernel::model::id::SubscriptionId::new())
        .bind(attendee)
        .bind(theirs.meetup_id)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();

        let available = repo
            .find_available_on(date.date_naive(), attendee, 1)
            .await
            .unwrap();
        assert!(available.is_empty());
    }

    #[sqlx::test(migrations = "../migrations")]
    #[ignore = "needs a running Postgres"]
    async fn update_by_someone_else_is_forbidden(pool: sqlx::PgPool) {
        let repo = MeetupRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let organizer = seed_user(&pool, "Olivia", "olivia@example.com").await;
        let stranger = seed_user(&pool, "Sam", "sam@example.com").await;
        let now = Utc::now();

        let created = repo
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

        let res = repo
            .delete(DeleteMeetup::new(created.meetup_id, stranger), now)
            .await;
        assert!(matches!(res, Err(AppError::ForbiddenOperation(_))));
    }
}
