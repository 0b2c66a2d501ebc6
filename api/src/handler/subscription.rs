use crate::{
    extractor::AuthorizedUser,
    model::subscription::{SubscriptionResponse, SubscriptionsResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use kernel::model::{
    id::{MeetupId, SubscriptionId, UserId},
    subscription::{
        event::{CreateSubscription, DeleteSubscription},
        Subscription,
    },
};
use kernel::notification::{NotifiedMeetup, NotifiedParty, SubscriptionConfirmed};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn subscribe_meetup(
    user: AuthorizedUser,
    Path(meetup_id): Path<MeetupId>,
    State(registry): State<AppRegistry>,
) -> AppResult<impl IntoResponse> {
    let now = registry.clock().now();
    let subscription = registry
        .subscription_repository()
        .create(CreateSubscription::new(meetup_id, user.id()), now)
        .await?;

    // The subscription is committed at this point; informing the organizer
    // is best-effort and must not fail the request.
    if let Err(e) = enqueue_confirmation(&registry, &subscription, user.id(), now).await {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            subscription_id = %subscription.subscription_id,
            "failed to enqueue the subscription notification"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(subscription)),
    ))
}

async fn enqueue_confirmation(
    registry: &AppRegistry,
    subscription: &Subscription,
    subscriber_id: UserId,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let meetup = registry
        .meetup_repository()
        .find_by_id(subscription.meetup.meetup_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!(
                "meetup ({}) was not found",
                subscription.meetup.meetup_id
            ))
        })?;
    let subscriber = registry
        .user_repository()
        .find_by_id(subscriber_id)
        .await?
        .ok_or_else(|| AppError::EntityNotFound(format!("user ({subscriber_id}) was not found")))?;

    let job = SubscriptionConfirmed {
        meetup: NotifiedMeetup {
            meetup_id: meetup.meetup_id,
            title: meetup.title,
            date: meetup.date,
        },
        organizer: NotifiedParty {
            user_id: meetup.organizer.user_id,
            user_name: meetup.organizer.user_name,
            email: meetup.organizer.email,
        },
        subscriber: NotifiedParty {
            user_id: subscriber.user_id,
            user_name: subscriber.user_name,
            email: subscriber.email,
        },
    };

    registry.notification_queue().enqueue(job, now).await?;
    Ok(())
}

pub async fn show_subscriptions(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<SubscriptionsResponse>> {
    let now = registry.clock().now();
    registry
        .subscription_repository()
        .find_live_by_user_id(user.id(), now)
        .await
        .map(SubscriptionsResponse::from)
        .map(Json)
}

pub async fn unsubscribe_meetup(
    user: AuthorizedUser,
    Path(subscription_id): Path<SubscriptionId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    let now = registry.clock().now();
    registry
        .subscription_repository()
        .delete(DeleteSubscription::new(subscription_id, user.id()), now)
        .await
        .map(|_| StatusCode::NO_CONTENT)
}
