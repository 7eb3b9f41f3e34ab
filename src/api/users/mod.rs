pub mod get;
pub mod list;
pub mod me;
pub mod subscribe;
pub mod subscriptions;

use crate::models::User;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for public user endpoints (anonymous allowed)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list::list_users))
        .route("/api/users/{id}", get(get::get_user))
}

/// Returns the router for user endpoints that always require auth
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(me::me))
        .route("/api/users/subscriptions", get(subscriptions::subscriptions))
        .route(
            "/api/users/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

/// Public profile view of a user, as embedded in recipes and lists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the requesting user follows this user (false for anonymous)
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        UserProfile {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_users,
        get::get_user,
        me::me,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::subscriptions,
    ),
    components(schemas(
        UserProfile,
        list::UsersListResponse,
        subscriptions::SubscriptionView,
        subscriptions::SubscriptionsResponse,
    ))
)]
pub struct ApiDoc;
