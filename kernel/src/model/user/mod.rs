use crate::model::id::UserId;

// Users are owned by the identity subsystem; this service only reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}
