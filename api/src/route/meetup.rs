use axum::{
    routing::{get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::meetup::{
    delete_meetup, register_meetup, show_available_meetups, show_organized_meetups, update_meetup,
};
use crate::handler::subscription::subscribe_meetup;

pub fn build_meetup_routers() -> Router<AppRegistry> {
    let meetup_routers = Router::new()
        .route("/", post(register_meetup).get(show_available_meetups))
        .route("/:meetup_id", put(update_meetup).delete(delete_meetup))
        .route("/:meetup_id/subscriptions", post(subscribe_meetup));

    Router::new()
        .nest("/meetups", meetup_routers)
        .route("/organizing", get(show_organized_meetups))
}
