use kernel::model::id::NotificationId;

/// A pending notification as handed to the worker.
#[derive(sqlx::FromRow)]
pub struct NotificationRow {
    pub notification_id: NotificationId,
    pub attempts: i32,
    pub payload: serde_json::Value,
}
