//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::error::TmdbError;
use super::rate_limiter::RequestPacer;
use super::types::{
    DiscoverMovieParams, MovieDetails, MoviePage, SearchMovieParams, TmdbErrorResponse,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sub-resources appended to a movie detail request.
const DETAIL_APPEND: &str = "credits,videos";

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
    /// Request pacer shared by all calls on this client.
    pacer: Arc<Mutex<RequestPacer>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            min_interval: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Sets the per-request timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set or blank ([`TmdbError::ConfigurationMissing`]).
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_token = self
            .api_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TmdbError::ConfigurationMissing(String::from("api_token is required")))?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let pacer = self
            .min_interval
            .map_or_else(RequestPacer::with_default_spacing, RequestPacer::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            api_token,
            pacer: Arc::new(Mutex::new(pacer)),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a paced GET request with Bearer auth and query params.
    ///
    /// Non-2xx responses become [`TmdbError::HttpStatus`]; nothing is retried.
    #[instrument(skip_all, fields(path = path))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.pacer.lock().await.acquire().await;

        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to join URL path: {path}"))?;

        let request = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(query)
            .build()
            .with_context(|| format!("failed to build request: {path}"))?;

        tracing::debug!(url = %request.url(), "TMDB API request");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(TmdbError::Network)
            .with_context(|| format!("request failed: {path}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            let message = serde_json::from_str::<TmdbErrorResponse>(&body).map_or(body, |e| {
                format!("code={}, message={}", e.status_code, e.status_message)
            });
            tracing::warn!(%status, %message, "TMDB API returned an error status");
            return Err(TmdbError::HttpStatus { status, message })
                .with_context(|| format!("request failed: {path}"));
        }

        let body = response
            .text()
            .await
            .map_err(TmdbError::Network)
            .with_context(|| format!("failed to read response body: {path}"))?;
        serde_json::from_str(&body)
            .map_err(TmdbError::Decode)
            .with_context(|| format!("failed to decode JSON response: {path}"))
    }
}

impl TmdbApi for TmdbClient {
    #[instrument(skip_all, fields(query = %params.query))]
    async fn search_movies(&self, params: &SearchMovieParams) -> Result<MoviePage> {
        let query: [(&str, String); 4] = [
            ("query", params.query.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
            ("include_adult", params.include_adult.to_string()),
        ];
        self.get_json("search/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn discover_movies(&self, params: &DiscoverMovieParams) -> Result<MoviePage> {
        let query: [(&str, String); 3] = [
            ("sort_by", params.sort_by.clone()),
            ("language", params.language.clone()),
            ("page", params.page.to_string()),
        ];
        self.get_json("discover/movie", &query).await
    }

    #[instrument(skip_all)]
    async fn trending_movies(&self, language: &str) -> Result<MoviePage> {
        let query = [("language", String::from(language))];
        self.get_json("trending/movie/week", &query).await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails> {
        let path = format!("movie/{movie_id}");
        let query = [
            ("language", String::from(language)),
            ("append_to_response", String::from(DETAIL_APPEND)),
        ];
        self.get_json(&path, &query).await
    }

    #[instrument(skip_all)]
    async fn probe_image(&self, url: &str) -> Result<bool> {
        let url = Url::parse(url).with_context(|| format!("invalid image URL: {url}"))?;
        let response = self
            .http_client
            .head(url)
            .send()
            .await
            .map_err(TmdbError::Network)
            .context("image probe failed")?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> TmdbClient {
        let base_url = format!("{}/3/", server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_token() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        let err = result.unwrap_err();
        assert!(err.to_string().contains("api_token is required"));
        assert!(matches!(
            err.downcast_ref::<TmdbError>(),
            Some(TmdbError::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_builder_rejects_blank_api_token() {
        // Arrange & Act
        let result = TmdbClient::builder()
            .api_token("   ")
            .user_agent("test/0.0.0")
            .build();

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_token("test-token").build();

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_custom_base_url() {
        // Arrange
        let custom_url = Url::parse("http://localhost:8080/3/").unwrap();

        // Act
        let client = TmdbClient::builder()
            .base_url(custom_url.clone())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url, custom_url);
    }

    #[test]
    fn test_parse_search_movie_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/search_movie_inception.json");

        // Act
        let page: MoviePage = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(page.page, 1);
        let first = &page.results[0];
        assert_eq!(first.id, 27_205);
        assert_eq!(first.title, "Inception");
        assert_eq!(first.original_language.as_deref(), Some("en"));
        assert!(page.results.iter().any(|m| m.poster_path.is_none()));
    }

    #[test]
    fn test_parse_movie_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tmdb/movie_details_27205.json");

        // Act
        let details: MovieDetails = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(details.id, 27_205);
        assert_eq!(details.runtime, Some(148));
        assert_eq!(details.genres.len(), 3);
        assert!(details.credits.unwrap().cast.len() > 6);
        assert!(!details.videos.unwrap().results.is_empty());
    }

    #[test]
    fn test_parse_error_response() {
        // Arrange
        let json = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        // Act
        let error: TmdbErrorResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(error.status_code, 7);
        assert!(!error.success);
    }

    #[tokio::test]
    async fn test_search_movies_sends_escaped_query() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_inception.json");

        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("query", "Amélie & friends"))
            .and(query_param("page", "1"))
            .and(query_param("include_adult", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let params = SearchMovieParams::new("Amélie & friends");

        // Act
        let page = client.search_movies(&params).await.unwrap();

        // Assert
        assert!(!page.results.is_empty());
    }

    #[tokio::test]
    async fn test_discover_movies_sorts_by_popularity() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/discover_movie.json");

        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("sort_by", "popularity.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let page = client
            .discover_movies(&DiscoverMovieParams::default())
            .await
            .unwrap();

        // Assert
        assert!(!page.results.is_empty());
    }

    #[tokio::test]
    async fn test_trending_movies_via_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/trending_movie_week.json");

        Mock::given(method("GET"))
            .and(path("/3/trending/movie/week"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let page = client.trending_movies("en-US").await.unwrap();

        // Assert
        assert!(page.results.len() > 5);
    }

    #[tokio::test]
    async fn test_movie_details_appends_credits_and_videos() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_details_27205.json");

        Mock::given(method("GET"))
            .and(path("/3/movie/27205"))
            .and(query_param("append_to_response", "credits,videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let details = client.movie_details(27_205, "en-US").await.unwrap();

        // Assert
        assert_eq!(details.title, "Inception");
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer my-secret-token"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("my-secret-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap();

        // Act & Assert (mock expect(1) verifies Authorization header)
        client
            .search_movies(&SearchMovieParams::new("test"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_error_is_classified() {
        // Arrange
        let mock_server = MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let err = client
            .search_movies(&SearchMovieParams::new("test"))
            .await
            .unwrap_err();

        // Assert
        assert!(format!("{err:#}").contains("Invalid API key"));
        match err.downcast_ref::<TmdbError>() {
            Some(TmdbError::HttpStatus { status, .. }) => assert_eq!(status.as_u16(), 401),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let result = client.trending_movies("en-US").await;

        // Assert
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        // Act
        let err = client.trending_movies("en-US").await.unwrap_err();

        // Assert
        assert!(matches!(
            err.downcast_ref::<TmdbError>(),
            Some(TmdbError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(json_body)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        // Act
        let err = client.trending_movies("en-US").await.unwrap_err();

        // Assert
        match err.downcast_ref::<TmdbError>() {
            Some(TmdbError::Network(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe_image_reports_status() {
        // Arrange
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/t/p/w500/ok.jpg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/t/p/w500/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let ok_url = format!("{}/t/p/w500/ok.jpg", mock_server.uri());
        let missing_url = format!("{}/t/p/w500/missing.jpg", mock_server.uri());

        // Act
        let ok = client.probe_image(&ok_url).await.unwrap();
        let missing = client.probe_image(&missing_url).await.unwrap();

        // Assert
        assert!(ok);
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_pacer_enforces_interval() {
        // Arrange
        let mock_server = MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_empty.json");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(100))
            .build()
            .unwrap();
        let params = SearchMovieParams::new("test");

        // Act
        let start = std::time::Instant::now();
        client.search_movies(&params).await.unwrap();
        client.search_movies(&params).await.unwrap();
        let elapsed = start.elapsed();

        // Assert: at least 100ms interval between two requests
        assert!(elapsed >= Duration::from_millis(100));
    }
}
