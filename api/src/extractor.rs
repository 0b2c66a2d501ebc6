use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use kernel::model::id::UserId;
use shared::error::AppError;
use std::str::FromStr;

/// Header carrying the verified caller id. Authentication itself ends at
/// the identity gateway in front of this service; requests reach us with
/// the actor already resolved.
const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

#[derive(Debug, Clone, Copy)]
pub struct AuthorizedUser {
    user_id: UserId,
}

impl AuthorizedUser {
    pub fn id(&self) -> UserId {
        self.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHENTICATED_USER_HEADER)
            .ok_or(AppError::UnauthenticatedError)?;
        let value = value.to_str().map_err(|_| AppError::UnauthenticatedError)?;
        let user_id = UserId::from_str(value).map_err(|_| AppError::UnauthenticatedError)?;
        Ok(Self { user_id })
    }
}
