use super::{meetup::build_meetup_routers, subscription::build_subscription_routers};
use axum::Router;
use registry::AppRegistry;

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_meetup_routers())
        .merge(build_subscription_routers());
    Router::new().nest("/api/v1", router)
}
