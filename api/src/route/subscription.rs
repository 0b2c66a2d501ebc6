use axum::{
    routing::{delete, get},
    Router,
};
use registry::AppRegistry;

use crate::handler::subscription::{show_subscriptions, unsubscribe_meetup};

pub fn build_subscription_routers() -> Router<AppRegistry> {
    let subscription_routers = Router::new()
        .route("/", get(show_subscriptions))
        .route("/:subscription_id", delete(unsubscribe_meetup));

    Router::new().nest("/subscriptions", subscription_routers)
}
