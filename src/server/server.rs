use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration, time::Instant};

use tracing::info;

use crate::catalog::CatalogManager;
use crate::catalog_store::CatalogStore;
use crate::config::SearchSettings;
use crate::search::SearchEngine;
use tower_http::services::ServeDir;

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;

use super::error::ApiResult;
use super::reviews::make_review_routes;
use super::songs::make_song_routes;
use super::views::{HomeResponse, SongView};
use super::{log_requests, state::ServerState, RequestsLoggingLevel, ServerConfig};

/// Songs shown in each home page listing.
pub const HOME_SONG_COUNT: usize = 4;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub songs_count: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn stats(State(state): State<ServerState>) -> Json<ServerStats> {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        songs_count: state.catalog.store().get_songs_count(),
    })
}

async fn home(State(state): State<ServerState>) -> ApiResult<Json<HomeResponse>> {
    let store = state.catalog.store();
    let recent = state
        .search
        .with_top_tags(store.recent_songs(HOME_SONG_COUNT)?)?;
    let most_reviewed = state
        .search
        .with_top_tags(store.most_reviewed_songs(HOME_SONG_COUNT)?)?;
    Ok(Json(HomeResponse {
        recent: recent.into_iter().map(SongView::from).collect(),
        most_reviewed: most_reviewed.into_iter().map(SongView::from).collect(),
    }))
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: Arc<dyn CatalogStore>,
        search_settings: SearchSettings,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog: CatalogManager::new(catalog_store.clone()),
            search: SearchEngine::new(catalog_store, search_settings),
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: Arc<dyn CatalogStore>,
    search_settings: SearchSettings,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog_store, search_settings);

    let api_routes: Router = Router::new()
        .route("/v1/home", get(home))
        .with_state(state.clone())
        .merge(make_song_routes(state.clone()))
        .merge(make_review_routes(state.clone()));

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(stats)).with_state(state.clone()),
    };

    let app: Router = home_router
        .merge(api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(
    catalog_store: Arc<dyn CatalogStore>,
    search_settings: SearchSettings,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, catalog_store, search_settings)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::SqliteCatalogStore;
    use crate::short_id;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    fn make_test_app() -> (TempDir, Router) {
        let temp_dir = TempDir::new().unwrap();
        let store =
            Arc::new(SqliteCatalogStore::new(temp_dir.path().join("catalog.db"), 1).unwrap());
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(config, store, SearchSettings::default()).unwrap();
        (temp_dir, app)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, user: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn formats_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn responds_unauthorized_on_anonymous_writes() {
        let (_dir, app) = make_test_app();
        let song_id = short_id::encode(&uuid::Uuid::new_v4());

        let requests = vec![
            ("POST", "/v1/songs".to_string()),
            ("PUT", format!("/v1/songs/{}", song_id)),
            ("DELETE", format!("/v1/songs/{}", song_id)),
            ("POST", format!("/v1/songs/{}/reviews", song_id)),
            ("PUT", format!("/v1/reviews/{}", song_id)),
            ("DELETE", format!("/v1/reviews/{}", song_id)),
            ("DELETE", "/v1/users/me/reviews".to_string()),
        ];

        for (method, uri) in requests {
            let request = json_request(method, &uri, None, serde_json::json!({}));
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }

    #[tokio::test]
    async fn responds_not_found_on_malformed_ids() {
        let (_dir, app) = make_test_app();
        for uri in ["/v1/songs/not-a-token!", "/v1/reviews/abc", "/v1/songs/abc/reviews"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn serves_stats_and_home() {
        let (_dir, app) = make_test_app();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["songs_count"], 0);
        assert!(json["uptime"].is_string());

        let request = Request::builder().uri("/v1/home").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["recent"], serde_json::json!([]));
        assert_eq!(json["most_reviewed"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn creates_and_fetches_song() {
        let (_dir, app) = make_test_app();

        let request = json_request(
            "POST",
            "/v1/songs",
            Some("7"),
            serde_json::json!({"title": "Love me", "composer": "John Smith"}),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["reviews_count"], 0);
        assert!(created["average_overall_rating"].is_null());

        let request = Request::builder()
            .uri(format!("/v1/songs/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["title"], "Love me");
        assert_eq!(fetched["composer"], "John Smith");
        assert!(fetched["arranger"].is_null());

        let request = json_request(
            "POST",
            "/v1/songs",
            Some("8"),
            serde_json::json!({"title": "ＬＯＶＥ ＭＥ", "composer": "johnsmith"}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let errors = body_json(response).await;
        assert!(errors["errors"][0]["field"].is_null());
    }

    #[tokio::test]
    async fn rejects_invalid_song_fields() {
        let (_dir, app) = make_test_app();

        let request = json_request(
            "POST",
            "/v1/songs",
            Some("7"),
            serde_json::json!({"title": "  ", "composer": "x".repeat(51)}),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        let fields: Vec<&str> = json["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["field"].as_str())
            .collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"composer"));
    }
}
