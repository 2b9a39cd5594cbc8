//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides methods for all server endpoints.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client acting either anonymously or as a given user
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Sent in the author header when set
    pub user_id: Option<i64>,
}

impl TestClient {
    /// Creates a client that sends no author header
    pub fn anonymous(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            user_id: None,
        }
    }

    /// Creates a client acting as `user_id`
    pub fn as_user(base_url: String, user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::anonymous(base_url)
        }
    }

    /// Creates a client acting as the regular test user
    pub fn authenticated(base_url: String) -> Self {
        Self::as_user(base_url, TEST_USER_ID)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.user_id {
            Some(user_id) => builder.header("X-User-Id", user_id.to_string()),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Response {
        builder.send().await.expect("Request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        Self::send(self.request(Method::GET, "/")).await
    }

    /// GET /v1/home
    pub async fn get_home(&self) -> Response {
        Self::send(self.request(Method::GET, "/v1/home")).await
    }

    // ========================================================================
    // Songs
    // ========================================================================

    /// GET /v1/songs with the given query parameters
    pub async fn search(&self, params: &[(&str, &str)]) -> Response {
        Self::send(self.request(Method::GET, "/v1/songs").query(params)).await
    }

    /// GET /v1/songs/autocomplete
    pub async fn autocomplete(&self, field: &str, query: &str) -> Response {
        Self::send(
            self.request(Method::GET, "/v1/songs/autocomplete")
                .query(&[("field", field), ("query", query)]),
        )
        .await
    }

    /// GET /v1/songs/check_duplicate
    pub async fn check_duplicate(&self, params: &[(&str, &str)]) -> Response {
        Self::send(
            self.request(Method::GET, "/v1/songs/check_duplicate")
                .query(params),
        )
        .await
    }

    /// POST /v1/songs
    pub async fn create_song(&self, body: &Value) -> Response {
        Self::send(self.request(Method::POST, "/v1/songs").json(body)).await
    }

    /// GET /v1/songs/{id}
    pub async fn get_song(&self, id: &str) -> Response {
        Self::send(self.request(Method::GET, &format!("/v1/songs/{}", id))).await
    }

    /// PUT /v1/songs/{id}
    pub async fn update_song(&self, id: &str, body: &Value) -> Response {
        Self::send(
            self.request(Method::PUT, &format!("/v1/songs/{}", id))
                .json(body),
        )
        .await
    }

    /// DELETE /v1/songs/{id}
    pub async fn delete_song(&self, id: &str) -> Response {
        Self::send(self.request(Method::DELETE, &format!("/v1/songs/{}", id))).await
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// GET /v1/songs/{id}/reviews, optionally filtered by tag
    pub async fn list_reviews(&self, song_id: &str, tag: Option<&str>) -> Response {
        let mut builder = self.request(Method::GET, &format!("/v1/songs/{}/reviews", song_id));
        if let Some(tag) = tag {
            builder = builder.query(&[("tag", tag)]);
        }
        Self::send(builder).await
    }

    /// POST /v1/songs/{id}/reviews
    pub async fn create_review(&self, song_id: &str, body: &Value) -> Response {
        Self::send(
            self.request(Method::POST, &format!("/v1/songs/{}/reviews", song_id))
                .json(body),
        )
        .await
    }

    /// Creates a review and returns its short id
    ///
    /// # Panics
    ///
    /// Panics if the review is rejected.
    pub async fn add_review(&self, song_id: &str, rating: i64, tags: &[&str]) -> String {
        let response = self.create_review(song_id, &review_body(rating, tags)).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Review creation failed"
        );
        let review: Value = response.json().await.expect("Invalid review JSON");
        review["id"]
            .as_str()
            .expect("Review without id")
            .to_string()
    }

    /// GET /v1/reviews/{id}
    pub async fn get_review(&self, id: &str) -> Response {
        Self::send(self.request(Method::GET, &format!("/v1/reviews/{}", id))).await
    }

    /// PUT /v1/reviews/{id}
    pub async fn update_review(&self, id: &str, body: &Value) -> Response {
        Self::send(
            self.request(Method::PUT, &format!("/v1/reviews/{}", id))
                .json(body),
        )
        .await
    }

    /// DELETE /v1/reviews/{id}
    pub async fn delete_review(&self, id: &str) -> Response {
        Self::send(self.request(Method::DELETE, &format!("/v1/reviews/{}", id))).await
    }

    /// DELETE /v1/users/me/reviews
    pub async fn delete_own_reviews(&self) -> Response {
        Self::send(self.request(Method::DELETE, "/v1/users/me/reviews")).await
    }
}

/// A review body with every dimension rated `rating`.
pub fn review_body(rating: i64, tags: &[&str]) -> Value {
    json!({
        "tempo_rating": rating,
        "fingering_technique_rating": rating,
        "plucking_technique_rating": rating,
        "expression_rating": rating,
        "memorization_rating": rating,
        "summary": "Nice piece",
        "tags": tags,
    })
}
