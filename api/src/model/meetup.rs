use chrono::{DateTime, Utc};
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{ImageId, MeetupId, UserId},
    meetup::{
        event::{CreateMeetup, UpdateMeetup},
        Meetup, MeetupOrganizer,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetupRequest {
    #[garde(length(min = 1))]
    pub title: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(length(min = 1))]
    pub location: String,
    #[garde(skip)]
    pub date: DateTime<Utc>,
    #[garde(skip)]
    pub image_id: ImageId,
}

#[derive(new)]
pub struct CreateMeetupRequestWithUser(UserId, CreateMeetupRequest);

impl From<CreateMeetupRequestWithUser> for CreateMeetup {
    fn from(value: CreateMeetupRequestWithUser) -> Self {
        let CreateMeetupRequestWithUser(
            organizer_id,
            CreateMeetupRequest {
                title,
                description,
                location,
                date,
                image_id,
            },
        ) = value;
        CreateMeetup {
            organizer_id,
            title,
            description,
            location,
            date,
            image_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetupRequest {
    #[garde(inner(length(min = 1)))]
    pub title: Option<String>,
    #[garde(inner(length(min = 1)))]
    pub description: Option<String>,
    #[garde(inner(length(min = 1)))]
    pub location: Option<String>,
    #[garde(skip)]
    pub date: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub image_id: Option<ImageId>,
}

#[derive(new)]
pub struct UpdateMeetupRequestWithIds(MeetupId, UserId, UpdateMeetupRequest);

impl From<UpdateMeetupRequestWithIds> for UpdateMeetup {
    fn from(value: UpdateMeetupRequestWithIds) -> Self {
        let UpdateMeetupRequestWithIds(
            meetup_id,
            requested_user,
            UpdateMeetupRequest {
                title,
                description,
                location,
                date,
                image_id,
            },
        ) = value;
        UpdateMeetup {
            meetup_id,
            requested_user,
            title,
            description,
            location,
            date,
            image_id,
        }
    }
}

/// Query for the by-day listing. The date stays a string so a malformed
/// value maps to the stable "Invalid date" response, not a generic
/// deserialization rejection.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeetupListQuery {
    #[garde(length(min = 1))]
    pub date: String,
    #[garde(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupsResponse {
    pub items: Vec<MeetupResponse>,
}

impl From<Vec<Meetup>> for MeetupsResponse {
    fn from(value: Vec<Meetup>) -> Self {
        Self {
            items: value.into_iter().map(MeetupResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupResponse {
    pub meetup_id: MeetupId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image_id: ImageId,
    pub organizer: MeetupOrganizerResponse,
}

impl From<Meetup> for MeetupResponse {
    fn from(value: Meetup) -> Self {
        let Meetup {
            meetup_id,
            title,
            description,
            location,
            date,
            image_id,
            organizer,
        } = value;
        Self {
            meetup_id,
            title,
            description,
            location,
            date,
            image_id,
            organizer: organizer.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupOrganizerResponse {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}

impl From<MeetupOrganizer> for MeetupOrganizerResponse {
    fn from(value: MeetupOrganizer) -> Self {
        let MeetupOrganizer {
            user_id,
            user_name,
            email,
        } = value;
        Self {
            user_id,
            user_name,
            email,
        }
    }
}
