// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, feed, interaction, notification, posts, profile},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes see an optional `Viewer`.
/// * Protected routes require a session (cookie or bearer token).
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-requested-with"),
        ]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let public_routes = Router::new()
        .route("/", get(feed::index))
        .route("/search/", get(feed::search))
        .route("/trending/", get(feed::trending))
        .route("/tags/{slug}/", get(feed::tag_posts))
        .route(
            "/post/{id}/",
            get(posts::post_detail)
                .merge(post(posts::add_comment).route_layer(require_auth.clone())),
        )
        .route("/profile/{username}/", get(profile::public_profile))
        .route("/profile/{username}/followers/", get(profile::list_followers))
        .route("/profile/{username}/following/", get(profile::list_following))
        .route("/signup/", post(auth::signup))
        .route("/login/", post(auth::login))
        .route("/logout/", post(auth::logout));

    let protected_routes = Router::new()
        .route("/add/", post(posts::add_post))
        .route("/post/{id}/comment/", post(posts::add_comment))
        .route("/post/delete/{id}/", post(posts::delete_post))
        .route("/comment/delete/{id}/", post(posts::delete_comment))
        .route("/post/like/{id}/", post(interaction::toggle_like))
        .route("/post/{id}/bookmark/", post(interaction::toggle_bookmark))
        .route("/bookmarks/", get(interaction::list_bookmarks))
        .route(
            "/profile/",
            get(profile::my_profile).post(profile::update_my_profile),
        )
        .route("/profile/{username}/follow/", post(interaction::toggle_follow))
        .route("/notifications/", get(notification::list_notifications))
        .route("/notifications/read-all/", post(notification::mark_all_read))
        .route("/notifications/{id}/read/", post(notification::mark_read))
        .route_layer(require_auth);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
