use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;
use crate::{auth, night, notify, roster, season, stats, tracking};

/// Every HTTP route. Reads are open; handlers that mutate check the
/// caller's `Access`, which the middleware attaches to each request.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/session", post(auth::create_session))
        .route(
            "/players",
            get(roster::handlers::list_players).post(roster::handlers::add_player),
        )
        .route("/players/:id", delete(roster::handlers::remove_player))
        .route(
            "/nights",
            get(night::handlers::list_nights).post(night::handlers::begin_night),
        )
        .route("/nights/:id", delete(night::handlers::delete_night))
        .route("/nights/:id/totals", get(night::handlers::night_totals))
        .route(
            "/nights/:id/games/:game_id/winner",
            post(night::handlers::toggle_winner),
        )
        .route("/tracking", get(tracking::handlers::current))
        .route(
            "/tracking/resume/:night_id",
            post(tracking::handlers::resume),
        )
        .route("/tracking/games", post(tracking::handlers::new_game))
        .route(
            "/tracking/games/:game_id",
            delete(tracking::handlers::delete_game),
        )
        .route(
            "/tracking/games/:game_id/winner",
            post(tracking::handlers::set_winner),
        )
        .route("/tracking/stat", post(tracking::handlers::log_stat))
        .route("/tracking/save", post(tracking::handlers::save))
        .route("/tracking/discard", post(tracking::handlers::discard))
        .route("/stats/season", get(stats::handlers::season))
        .route("/stats/leaders", get(stats::handlers::leaders))
        .route("/reload", post(season::handlers::reload))
        .route("/notifications", get(notify::handlers::pending))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_access,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
