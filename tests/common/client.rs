//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides methods for all songpin-server endpoints.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// HTTP test client holding a bearer token once logged in
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    token: Mutex<Option<String>>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: Mutex::new(None),
        }
    }

    /// Creates a client pre-authenticated as the regular test member
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client pre-authenticated as the second test member
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER, OTHER_PASS).await
    }

    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let status = client.login(handle, password).await;
        assert_eq!(
            status,
            StatusCode::CREATED,
            "Authentication of {} failed",
            handle
        );
        client
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().expect("token lock poisoned").clone()
    }

    /// Overrides the bearer token sent with each request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.lock().expect("token lock poisoned") = token;
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get(&self, path: &str) -> Response {
        self.with_auth(self.client.get(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn delete(&self, path: &str) -> Response {
        self.with_auth(self.client.delete(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("DELETE request failed")
    }

    async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.with_auth(self.client.post(format!("{}{}", self.base_url, path)))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.with_auth(self.client.put(format!("{}{}", self.base_url, path)))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/signup
    pub async fn signup(&self, handle: &str, nickname: &str, password: &str) -> Response {
        self.post_json(
            "/v1/auth/signup",
            &json!({ "handle": handle, "nickname": nickname, "password": password }),
        )
        .await
    }

    /// POST /v1/auth/login, keeps the issued token on success
    pub async fn login(&self, handle: &str, password: &str) -> StatusCode {
        let response = self
            .post_json(
                "/v1/auth/login",
                &json!({ "handle": handle, "password": password }),
            )
            .await;
        let status = response.status();
        if status == StatusCode::CREATED {
            let body: Value = response.json().await.expect("Login body is not JSON");
            let token = body["token"].as_str().map(str::to_string);
            assert!(token.is_some(), "Login response without token: {}", body);
            self.set_token(token);
        }
        status
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    /// GET /v1/me
    pub async fn get_me(&self) -> Response {
        self.get("/v1/me").await
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Pin and Song Endpoints
    // ========================================================================

    /// POST /v1/pins
    pub async fn create_pin(&self, body: &Value) -> Response {
        self.post_json("/v1/pins", body).await
    }

    /// POST /v1/pins, returning the song id
    ///
    /// # Panics
    ///
    /// Panics if the pin is not created.
    pub async fn create_pin_ok(&self, body: &Value) -> i64 {
        let response = self.create_pin(body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.expect("Pin body is not JSON");
        body["song_id"].as_i64().expect("Missing song_id")
    }

    /// GET /v1/pins/{id}
    pub async fn get_pin(&self, pin_id: i64) -> Response {
        self.get(&format!("/v1/pins/{}", pin_id)).await
    }

    /// PUT /v1/pins/{id}
    pub async fn update_pin(&self, pin_id: i64, body: &Value) -> Response {
        self.put_json(&format!("/v1/pins/{}", pin_id), body).await
    }

    /// DELETE /v1/pins/{id}
    pub async fn delete_pin(&self, pin_id: i64) -> Response {
        self.delete(&format!("/v1/pins/{}", pin_id)).await
    }

    /// GET /v1/songs/{id}
    pub async fn get_song(&self, song_id: i64) -> Response {
        self.get(&format!("/v1/songs/{}", song_id)).await
    }

    /// GET /v1/songs/{id}/pins
    pub async fn get_song_pins(&self, song_id: i64, only_my_pins: bool) -> Response {
        self.get(&format!("/v1/songs/{}/pins?only_my_pins={}", song_id, only_my_pins)).await
    }

    /// GET /v1/songs/{id}/pins, returning the parsed list
    pub async fn get_song_pins_ok(&self, song_id: i64, only_my_pins: bool) -> Vec<Value> {
        let response = self.get_song_pins(song_id, only_my_pins).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.expect("Pins body is not a JSON list")
    }

    // ========================================================================
    // Place Endpoints
    // ========================================================================

    /// GET /v1/places/search
    pub async fn search_places(
        &self,
        keyword: &str,
        sort_by: &str,
        page: i64,
        size: i64,
    ) -> Response {
        self.with_auth(
            self.client
                .get(format!("{}/v1/places/search", self.base_url))
                .query(&[
                    ("keyword", keyword.to_string()),
                    ("sort_by", sort_by.to_string()),
                    ("page", page.to_string()),
                    ("size", size.to_string()),
                ]),
        )
        .send()
        .await
        .expect("Place search request failed")
    }

    /// GET /v1/places/newest
    pub async fn newest_places(&self) -> Response {
        self.get("/v1/places/newest").await
    }

    // ========================================================================
    // Playlist Endpoints
    // ========================================================================

    /// POST /v1/playlists
    pub async fn create_playlist(&self, name: &str, visibility: &str) -> Response {
        self.post_json(
            "/v1/playlists",
            &json!({ "playlist_name": name, "visibility": visibility }),
        )
        .await
    }

    /// POST /v1/playlists, returning the playlist id
    pub async fn create_playlist_ok(&self, name: &str, visibility: &str) -> i64 {
        let response = self.create_playlist(name, visibility).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.expect("Playlist body is not JSON");
        body["playlist_id"].as_i64().expect("Missing playlist_id")
    }

    /// GET /v1/playlists/{id}
    pub async fn get_playlist(&self, playlist_id: i64) -> Response {
        self.get(&format!("/v1/playlists/{}", playlist_id)).await
    }

    /// PUT /v1/playlists/{id}
    pub async fn update_playlist(&self, playlist_id: i64, body: &Value) -> Response {
        self.put_json(&format!("/v1/playlists/{}", playlist_id), body).await
    }

    /// DELETE /v1/playlists/{id}
    pub async fn delete_playlist(&self, playlist_id: i64) -> Response {
        self.delete(&format!("/v1/playlists/{}", playlist_id)).await
    }

    /// POST /v1/playlists/{id}/pins
    pub async fn add_playlist_pins(&self, playlist_id: i64, pin_ids: &[i64]) -> Response {
        self.post_json(
            &format!("/v1/playlists/{}/pins", playlist_id),
            &json!({ "pin_ids": pin_ids }),
        )
        .await
    }

    /// GET /v1/me/playlists
    pub async fn my_playlists(&self) -> Response {
        self.get("/v1/me/playlists").await
    }
}
