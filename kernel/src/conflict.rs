//! Scheduling rules for meetups and subscriptions.
//!
//! Every function here is a pure decision over values the caller already
//! loaded. None of them touch the database or the wall clock, so the
//! repositories can evaluate them in the middle of a transaction and the
//! tests can pin `now` to an arbitrary instant.

use crate::model::id::{MeetupId, UserId};
use crate::model::meetup::Meetup;
use crate::model::subscription::Subscription;
use chrono::{DateTime, Utc};
use shared::error::AppError;
use thiserror::Error;

/// Reasons an operation is refused. Each maps to one stable user-facing
/// message, so callers never need to parse free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Deny {
    #[error("Past dates are not permitted")]
    PastDate,
    #[error("User is not the organizer")]
    NotOrganizer,
    #[error("Meetup has already happened")]
    MeetupIsPast,
    #[error("Can not subscribe to your own meetups")]
    OwnMeetup,
    #[error("Can not subscribe to past meetups")]
    PastMeetup,
    #[error("Already subscribed to this meetup")]
    AlreadySubscribed,
    #[error("Can not subscribe to two meetups at the same time")]
    TimeConflict,
    #[error("User does not own this subscription")]
    NotOwner,
}

impl From<Deny> for AppError {
    fn from(value: Deny) -> Self {
        match value {
            Deny::NotOrganizer | Deny::NotOwner => {
                AppError::ForbiddenOperation(value.to_string())
            }
            _ => AppError::UnprocessableEntity(value.to_string()),
        }
    }
}

/// A meetup the subscriber already holds a live subscription to. The
/// subscribe check only needs the target id and its instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldSlot {
    pub meetup_id: MeetupId,
    pub date: DateTime<Utc>,
}

/// The single definition of "past". Every rule below goes through this so
/// the threshold can never drift between call sites.
pub fn is_past(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date < now
}

pub fn can_create_meetup(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), Deny> {
    if is_past(date, now) {
        return Err(Deny::PastDate);
    }
    Ok(())
}

/// Covers both field updates and deletion. A changed date must additionally
/// pass [`can_create_meetup`]; the repository re-checks that itself.
pub fn can_mutate_meetup(
    meetup: &Meetup,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> Result<(), Deny> {
    if meetup.organizer.user_id != actor_id {
        return Err(Deny::NotOrganizer);
    }
    if is_past(meetup.date, now) {
        return Err(Deny::MeetupIsPast);
    }
    Ok(())
}

/// First matching rule wins: OwnMeetup, PastMeetup, AlreadySubscribed,
/// TimeConflict, in that order.
pub fn can_subscribe(
    meetup: &Meetup,
    subscriber_id: UserId,
    held: &[HeldSlot],
    now: DateTime<Utc>,
) -> Result<(), Deny> {
    if meetup.organizer.user_id == subscriber_id {
        return Err(Deny::OwnMeetup);
    }
    if is_past(meetup.date, now) {
        return Err(Deny::PastMeetup);
    }
    if held.iter().any(|s| s.meetup_id == meetup.meetup_id) {
        return Err(Deny::AlreadySubscribed);
    }
    if held
        .iter()
        .any(|s| s.meetup_id != meetup.meetup_id && s.date == meetup.date)
    {
        return Err(Deny::TimeConflict);
    }
    Ok(())
}

pub fn can_unsubscribe(
    subscription: &Subscription,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> Result<(), Deny> {
    if subscription.user_id != actor_id {
        return Err(Deny::NotOwner);
    }
    if is_past(subscription.meetup.date, now) {
        return Err(Deny::MeetupIsPast);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::{ImageId, SubscriptionId};
    use crate::model::meetup::MeetupOrganizer;
    use crate::model::subscription::SubscriptionMeetup;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn meetup(organizer_id: UserId, date: DateTime<Utc>) -> Meetup {
        Meetup {
            meetup_id: MeetupId::new(),
            title: "Rust meetup".into(),
            description: "Monthly get-together".into(),
            location: "Main street 1".into(),
            date,
            image_id: ImageId::new(),
            organizer: MeetupOrganizer {
                user_id: organizer_id,
                user_name: "Olivia Organizer".into(),
                email: "olivia@example.com".into(),
            },
        }
    }

    fn subscription(
        user_id: UserId,
        meetup_id: MeetupId,
        date: DateTime<Utc>,
    ) -> Subscription {
        Subscription {
            subscription_id: SubscriptionId::new(),
            user_id,
            created_at: now() - Duration::days(1),
            meetup: SubscriptionMeetup {
                meetup_id,
                title: "Rust meetup".into(),
                location: "Main street 1".into(),
                date,
            },
        }
    }

    #[test]
    fn create_allows_future_and_present_dates() {
        assert_eq!(can_create_meetup(now() + Duration::hours(1), now()), Ok(()));
        // the exact current instant is not past
        assert_eq!(can_create_meetup(now(), now()), Ok(()));
    }

    #[test]
    fn create_denies_past_dates() {
        assert_eq!(
            can_create_meetup(now() - Duration::seconds(1), now()),
            Err(Deny::PastDate)
        );
    }

    #[test]
    fn mutate_denies_non_organizer_before_checking_the_date() {
        let m = meetup(UserId::new(), now() - Duration::hours(1));
        assert_eq!(
            can_mutate_meetup(&m, UserId::new(), now()),
            Err(Deny::NotOrganizer)
        );
    }

    #[test]
    fn mutate_denies_past_meetups_for_the_organizer() {
        let organizer = UserId::new();
        let m = meetup(organizer, now() - Duration::seconds(1));
        assert_eq!(can_mutate_meetup(&m, organizer, now()), Err(Deny::MeetupIsPast));
    }

    #[test]
    fn mutate_is_a_pure_function_of_date_and_now() {
        let organizer = UserId::new();
        let m = meetup(organizer, now());
        // legal at the threshold instant, illegal one instant later
        assert_eq!(can_mutate_meetup(&m, organizer, now()), Ok(()));
        assert_eq!(
            can_mutate_meetup(&m, organizer, now() + Duration::seconds(1)),
            Err(Deny::MeetupIsPast)
        );
    }

    #[test]
    fn subscribe_denies_own_meetup_regardless_of_other_state() {
        let organizer = UserId::new();
        let past = meetup(organizer, now() - Duration::hours(1));
        assert_eq!(
            can_subscribe(&past, organizer, &[], now()),
            Err(Deny::OwnMeetup)
        );
    }

    #[test]
    fn subscribe_denies_past_meetups() {
        let m = meetup(UserId::new(), now() - Duration::hours(1));
        assert_eq!(
            can_subscribe(&m, UserId::new(), &[], now()),
            Err(Deny::PastMeetup)
        );
    }

    #[test]
    fn subscribe_denies_double_subscription_to_the_same_meetup() {
        let m = meetup(UserId::new(), now() + Duration::hours(1));
        let held = [HeldSlot {
            meetup_id: m.meetup_id,
            date: m.date,
        }];
        assert_eq!(
            can_subscribe(&m, UserId::new(), &held, now()),
            Err(Deny::AlreadySubscribed)
        );
    }

    #[test]
    fn already_subscribed_wins_over_time_conflict() {
        let m = meetup(UserId::new(), now() + Duration::hours(1));
        // same meetup and another meetup at the identical instant
        let held = [
            HeldSlot {
                meetup_id: MeetupId::new(),
                date: m.date,
            },
            HeldSlot {
                meetup_id: m.meetup_id,
                date: m.date,
            },
        ];
        assert_eq!(
            can_subscribe(&m, UserId::new(), &held, now()),
            Err(Deny::AlreadySubscribed)
        );
    }

    #[test]
    fn subscribe_denies_two_meetups_at_the_same_instant() {
        let m = meetup(UserId::new(), now() + Duration::hours(1));
        let held = [HeldSlot {
            meetup_id: MeetupId::new(),
            date: m.date,
        }];
        assert_eq!(
            can_subscribe(&m, UserId::new(), &held, now()),
            Err(Deny::TimeConflict)
        );
    }

    #[test]
    fn subscribe_allows_meetups_at_a_different_instant() {
        let m = meetup(UserId::new(), now() + Duration::hours(1));
        let held = [HeldSlot {
            meetup_id: MeetupId::new(),
            date: m.date + Duration::hours(2),
        }];
        assert_eq!(can_subscribe(&m, UserId::new(), &held, now()), Ok(()));
    }

    #[test]
    fn subscribe_allows_with_no_existing_subscriptions() {
        let m = meetup(UserId::new(), now() + Duration::hours(1));
        assert_eq!(can_subscribe(&m, UserId::new(), &[], now()), Ok(()));
    }

    #[test]
    fn unsubscribe_denies_non_owner() {
        let s = subscription(UserId::new(), MeetupId::new(), now() + Duration::hours(1));
        assert_eq!(
            can_unsubscribe(&s, UserId::new(), now()),
            Err(Deny::NotOwner)
        );
    }

    #[test]
    fn unsubscribe_denies_once_the_meetup_is_past() {
        let attendee = UserId::new();
        let s = subscription(attendee, MeetupId::new(), now());
        assert_eq!(can_unsubscribe(&s, attendee, now()), Ok(()));
        assert_eq!(
            can_unsubscribe(&s, attendee, now() + Duration::seconds(1)),
            Err(Deny::MeetupIsPast)
        );
    }

    #[test]
    fn forbidden_reasons_map_to_forbidden_errors() {
        assert!(matches!(
            AppError::from(Deny::NotOrganizer),
            AppError::ForbiddenOperation(_)
        ));
        assert!(matches!(
            AppError::from(Deny::NotOwner),
            AppError::ForbiddenOperation(_)
        ));
        assert!(matches!(
            AppError::from(Deny::TimeConflict),
            AppError::UnprocessableEntity(_)
        ));
    }
}
