use crate::{
    extractor::AuthorizedUser,
    model::meetup::{
        CreateMeetupRequest, CreateMeetupRequestWithUser, MeetupListQuery, MeetupResponse,
        MeetupsResponse, UpdateMeetupRequest, UpdateMeetupRequestWithIds,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use garde::Validate;
use kernel::model::{id::MeetupId, meetup::event::DeleteMeetup};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

pub async fn register_meetup(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateMeetupRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;

    let now = registry.clock().now();
    let meetup = registry
        .meetup_repository()
        .create(CreateMeetupRequestWithUser::new(user.id(), req).into(), now)
        .await?;

    Ok((StatusCode::CREATED, Json(MeetupResponse::from(meetup))))
}

pub async fn show_available_meetups(
    user: AuthorizedUser,
    Query(query): Query<MeetupListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MeetupsResponse>> {
    query.validate()?;
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| AppError::UnprocessableEntity("Invalid date".into()))?;

    registry
        .meetup_repository()
        .find_available_on(date, user.id(), query.page)
        .await
        .map(MeetupsResponse::from)
        .map(Json)
}

pub async fn update_meetup(
    user: AuthorizedUser,
    Path(meetup_id): Path<MeetupId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateMeetupRequest>,
) -> AppResult<Json<MeetupResponse>> {
    req.validate()?;

    let now = registry.clock().now();
    let update_meetup = UpdateMeetupRequestWithIds::new(meetup_id, user.id(), req);
    registry
        .meetup_repository()
        .update(update_meetup.into(), now)
        .await
        .map(MeetupResponse::from)
        .map(Json)
}

pub async fn delete_meetup(
    user: AuthorizedUser,
    Path(meetup_id): Path<MeetupId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    let now = registry.clock().now();
    registry
        .meetup_repository()
        .delete(DeleteMeetup::new(meetup_id, user.id()), now)
        .await
        .map(|_| StatusCode::NO_CONTENT)
}

pub async fn show_organized_meetups(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<MeetupsResponse>> {
    registry
        .meetup_repository()
        .find_by_organizer(user.id())
        .await
        .map(MeetupsResponse::from)
        .map(Json)
}
