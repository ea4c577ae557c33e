//! Debounced movie search pipeline.
//!
//! A [`SearchPipeline`] turns raw query edits into at most one fetch per
//! settled query and applies completions only when they belong to the most
//! recently issued request. The primary search list and the suggestions
//! dropdown are two independent instances with different [`PipelineConfig`]s.

use std::time::Duration;

use anyhow::Result;
use reelview_api::tmdb::{
    DiscoverMovieParams, MoviePage, MovieSummary, SearchMovieParams, TmdbApi, user_message,
};
use tokio::time::Instant;

use crate::debounce::Debouncer;

/// What a pipeline does when the settled query is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyQuery {
    /// Fetch the popularity listing instead of searching.
    Discover,
    /// Go back to `Idle` without a request.
    Idle,
}

/// Tuning for one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Quiescence window before a query is fetched.
    pub debounce: Duration,
    /// Maximum number of results kept for display.
    pub limit: usize,
    /// Handling of blank queries.
    pub empty_query: EmptyQuery,
}

impl PipelineConfig {
    /// Primary search list: 500ms window, 20 results, blank query lists popular movies.
    #[must_use]
    pub const fn search() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            limit: 20,
            empty_query: EmptyQuery::Discover,
        }
    }

    /// Suggestions dropdown: 300ms window, 6 results, blank query shows nothing.
    #[must_use]
    pub const fn suggestions() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            limit: 6,
            empty_query: EmptyQuery::Idle,
        }
    }
}

/// Remote request chosen for a settled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieQuery {
    /// `discover/movie` sorted by popularity.
    Discover,
    /// `search/movie` with the exact query text, page 1.
    Search(String),
}

impl MovieQuery {
    /// Routes a settled query: empty ⇒ discover, anything else ⇒ keyword search.
    #[must_use]
    pub fn for_query(query: &str) -> Self {
        if query.is_empty() {
            Self::Discover
        } else {
            Self::Search(String::from(query))
        }
    }
}

/// A request issued by a pipeline, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Generation that must still be current when the response arrives.
    pub generation: u64,
    /// Request to send.
    pub query: MovieQuery,
}

/// Observable pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    /// Nothing requested.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request failed; carries a user-facing message.
    Error(String),
    /// The last request succeeded with zero results.
    Empty,
    /// The last request succeeded; results are truncated to the limit.
    Ready(Vec<MovieSummary>),
}

/// Debounced, last-request-wins search pipeline.
#[derive(Debug)]
pub struct SearchPipeline {
    /// Name used in log fields.
    name: &'static str,
    /// Tuning.
    config: PipelineConfig,
    /// Pending query edits.
    debouncer: Debouncer<String>,
    /// Generation of the most recently issued request.
    generation: u64,
    /// Last query that made it through the debouncer.
    settled: Option<String>,
    /// Current state.
    state: RequestState,
}

impl SearchPipeline {
    /// Creates an idle pipeline.
    #[must_use]
    pub const fn new(name: &'static str, config: PipelineConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce);
        Self {
            name,
            config,
            debouncer,
            generation: 0,
            settled: None,
            state: RequestState::Idle,
        }
    }

    /// Settles the initial (blank) query immediately.
    ///
    /// Returns the first ticket for pipelines that list popular movies on a
    /// blank query.
    pub fn mount(&mut self) -> Option<FetchTicket> {
        self.debouncer.cancel();
        self.settle(String::new())
    }

    /// Records a query edit; the previous pending edit is discarded.
    pub fn on_input(&mut self, query: &str, now: Instant) {
        self.debouncer.push(String::from(query), now);
    }

    /// Emits a ticket once the pending query has settled and differs from the
    /// last settled one.
    pub fn poll(&mut self, now: Instant) -> Option<FetchTicket> {
        let query = self.debouncer.poll(now)?;
        if self.settled.as_deref() == Some(query.as_str()) {
            return None;
        }
        self.settle(query)
    }

    /// Next instant at which [`poll`](Self::poll) may emit.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    fn settle(&mut self, query: String) -> Option<FetchTicket> {
        let request = MovieQuery::for_query(&query);
        self.settled = Some(query);
        self.generation = self.generation.wrapping_add(1);

        if request == MovieQuery::Discover && self.config.empty_query == EmptyQuery::Idle {
            self.state = RequestState::Idle;
            return None;
        }

        tracing::debug!(
            pipeline = self.name,
            generation = self.generation,
            ?request,
            "query settled"
        );
        self.state = RequestState::Loading;
        Some(FetchTicket {
            generation: self.generation,
            query: request,
        })
    }

    /// Applies a completed fetch.
    ///
    /// Returns `false` and leaves the state untouched when `generation` is not
    /// the most recently issued one.
    pub fn complete(&mut self, generation: u64, result: Result<MoviePage>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                pipeline = self.name,
                generation,
                current = self.generation,
                "discarding stale response"
            );
            return false;
        }

        self.state = match result {
            Ok(page) => {
                let mut movies = page.results;
                movies.truncate(self.config.limit);
                if movies.is_empty() {
                    RequestState::Empty
                } else {
                    RequestState::Ready(movies)
                }
            }
            Err(e) => {
                tracing::warn!(pipeline = self.name, error = %format!("{e:#}"), "fetch failed");
                RequestState::Error(user_message(&e))
            }
        };
        true
    }

    /// Cancels the pending edit and orphans any in-flight request.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
        self.generation = self.generation.wrapping_add(1);
        if self.state == RequestState::Loading {
            self.state = RequestState::Idle;
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &RequestState {
        &self.state
    }

    /// Results when `Ready`, otherwise an empty slice.
    #[must_use]
    pub fn results(&self) -> &[MovieSummary] {
        match &self.state {
            RequestState::Ready(movies) => movies,
            _ => &[],
        }
    }

    /// Last settled query.
    #[must_use]
    pub fn settled_query(&self) -> Option<&str> {
        self.settled.as_deref()
    }

    /// Generation of the most recently issued request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Tuning of this pipeline.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Sends the request described by `query`.
///
/// # Errors
///
/// Returns an error if the TMDB request fails.
pub async fn fetch_page<A>(api: &A, query: &MovieQuery, language: &str) -> Result<MoviePage>
where
    A: TmdbApi + Sync + ?Sized,
{
    match query {
        MovieQuery::Discover => {
            let params = DiscoverMovieParams::default().language(language);
            api.discover_movies(&params).await
        }
        MovieQuery::Search(text) => {
            let params = SearchMovieParams::new(text.as_str())
                .language(language)
                .page(1);
            api.search_movies(&params).await
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::arithmetic_side_effects)]

    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use reelview_api::tmdb::MovieDetails;

    use super::*;

    pub(crate) fn movie(id: u64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: String::from(title),
            poster_path: None,
            vote_average: Some(7.0),
            release_date: Some(String::from("2020-01-01")),
            original_language: Some(String::from("en")),
            overview: None,
        }
    }

    pub(crate) fn page(titles: &[&str]) -> MoviePage {
        let results: Vec<MovieSummary> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| movie(u64::try_from(i).unwrap() + 1, t))
            .collect();
        MoviePage {
            page: 1,
            total_pages: 1,
            total_results: u32::try_from(results.len()).unwrap(),
            results,
        }
    }

    /// Records every request and answers each search after a per-query delay.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedApi {
        pub(crate) calls: Mutex<Vec<String>>,
        pub(crate) delays: Vec<(String, Duration)>,
    }

    impl TmdbApi for ScriptedApi {
        async fn search_movies(&self, params: &SearchMovieParams) -> Result<MoviePage> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("search:{}", params.query));
            let delay = self
                .delays
                .iter()
                .find(|(q, _)| *q == params.query)
                .map_or(Duration::ZERO, |(_, d)| *d);
            tokio::time::sleep(delay).await;
            Ok(page(&[params.query.as_str()]))
        }

        async fn discover_movies(&self, _params: &DiscoverMovieParams) -> Result<MoviePage> {
            self.calls.lock().unwrap().push(String::from("discover"));
            Ok(page(&["Popular 1", "Popular 2"]))
        }

        async fn trending_movies(&self, _language: &str) -> Result<MoviePage> {
            bail!("not scripted")
        }

        async fn movie_details(&self, _movie_id: u64, _language: &str) -> Result<MovieDetails> {
            bail!("not scripted")
        }

        async fn probe_image(&self, _url: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_rapid_edits_issue_one_ticket_for_final_query() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        let mut tickets = Vec::new();

        // Act: typing faster than the 500ms window
        for (i, text) in ["d", "du", "dun", "dune"].iter().enumerate() {
            let at = start + Duration::from_millis(200) * u32::try_from(i).unwrap();
            tickets.extend(pipeline.poll(at));
            pipeline.on_input(text, at);
        }
        tickets.extend(pipeline.poll(start + Duration::from_secs(5)));

        // Assert
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].query, MovieQuery::Search(String::from("dune")));
        assert_eq!(pipeline.state(), &RequestState::Loading);
    }

    #[test]
    fn test_empty_query_routes_to_discover() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        pipeline.on_input("x", start);
        let _ = pipeline.poll(start + Duration::from_secs(1));

        // Act
        pipeline.on_input("", start + Duration::from_secs(2));
        let ticket = pipeline.poll(start + Duration::from_secs(3)).unwrap();

        // Assert
        assert_eq!(ticket.query, MovieQuery::Discover);
        assert_eq!(
            MovieQuery::for_query("   "),
            MovieQuery::Search(String::from("   "))
        );
    }

    #[test]
    fn test_mount_lists_popular_movies() {
        // Arrange
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());

        // Act
        let ticket = pipeline.mount().unwrap();

        // Assert
        assert_eq!(ticket.query, MovieQuery::Discover);
        assert_eq!(ticket.generation, 1);
    }

    #[test]
    fn test_suggestions_ignore_blank_query() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("suggestions", PipelineConfig::suggestions());
        assert!(pipeline.mount().is_none());
        pipeline.on_input("al", start);
        let ticket = pipeline.poll(start + Duration::from_millis(300)).unwrap();
        assert!(pipeline.complete(ticket.generation, Ok(page(&["Alien"]))));

        // Act
        pipeline.on_input("", start + Duration::from_secs(1));
        let blank = pipeline.poll(start + Duration::from_secs(2));

        // Assert
        assert!(blank.is_none());
        assert_eq!(pipeline.state(), &RequestState::Idle);
    }

    #[test]
    fn test_unchanged_settled_query_is_not_refetched() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        pipeline.on_input("alien", start);
        assert!(pipeline.poll(start + Duration::from_secs(1)).is_some());

        // Act: "alien" -> "alie" -> "alien" within one window
        pipeline.on_input("alie", start + Duration::from_secs(2));
        pipeline.on_input("alien", start + Duration::from_millis(2100));
        let ticket = pipeline.poll(start + Duration::from_secs(3));

        // Assert
        assert!(ticket.is_none());
    }

    #[test]
    fn test_results_are_truncated_to_limit() {
        // Arrange
        let mut pipeline = SearchPipeline::new("suggestions", PipelineConfig::suggestions());
        let start = Instant::now();
        pipeline.on_input("star", start);
        let ticket = pipeline.poll(start + Duration::from_secs(1)).unwrap();
        let many = page(&["1", "2", "3", "4", "5", "6", "7", "8"]);

        // Act
        pipeline.complete(ticket.generation, Ok(many));

        // Assert
        assert_eq!(pipeline.results().len(), 6);
        assert_eq!(pipeline.results()[0].title, "1");
    }

    #[test]
    fn test_zero_results_is_empty_not_error() {
        // Arrange
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        let ticket = pipeline.mount().unwrap();

        // Act
        pipeline.complete(ticket.generation, Ok(page(&[])));

        // Assert
        assert_eq!(pipeline.state(), &RequestState::Empty);
    }

    #[test]
    fn test_failure_replaces_previous_results() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        let first = pipeline.mount().unwrap();
        pipeline.complete(first.generation, Ok(page(&["Heat"])));
        pipeline.on_input("x", start);
        let second = pipeline.poll(start + Duration::from_secs(1)).unwrap();

        // Act
        pipeline.complete(second.generation, Err(anyhow::anyhow!("connection reset")));

        // Assert
        assert!(matches!(pipeline.state(), RequestState::Error(_)));
        assert!(pipeline.results().is_empty());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        pipeline.on_input("batman", start);
        let first = pipeline.poll(start + Duration::from_secs(1)).unwrap();
        pipeline.on_input("superman", start + Duration::from_secs(2));
        let second = pipeline.poll(start + Duration::from_secs(3)).unwrap();

        // Act: newer response arrives first, older one last
        let applied_second = pipeline.complete(second.generation, Ok(page(&["Superman"])));
        let applied_first = pipeline.complete(first.generation, Ok(page(&["Batman"])));

        // Assert
        assert!(applied_second);
        assert!(!applied_first);
        assert_eq!(pipeline.results()[0].title, "Superman");
    }

    #[test]
    fn test_cancel_orphans_in_flight_request() {
        // Arrange
        let start = Instant::now();
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        let ticket = pipeline.mount().unwrap();
        pipeline.on_input("pending", start);

        // Act
        pipeline.cancel();

        // Assert
        assert!(!pipeline.complete(ticket.generation, Ok(page(&["Late"]))));
        assert!(pipeline.poll(start + Duration::from_secs(10)).is_none());
        assert_eq!(pipeline.state(), &RequestState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_first_response_does_not_overwrite_newer_results() {
        // Arrange
        let api = Arc::new(ScriptedApi {
            delays: vec![
                (String::from("batman"), Duration::from_secs(3)),
                (String::from("superman"), Duration::from_millis(100)),
            ],
            ..ScriptedApi::default()
        });
        let mut pipeline = SearchPipeline::new("search", PipelineConfig::search());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let start = Instant::now();
        pipeline.on_input("batman", start);
        let first = pipeline.poll(start + Duration::from_secs(1)).unwrap();
        pipeline.on_input("superman", start + Duration::from_secs(1));
        let second = pipeline.poll(start + Duration::from_secs(2)).unwrap();

        for ticket in [first, second] {
            let api = Arc::clone(&api);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = fetch_page(api.as_ref(), &ticket.query, "en-US").await;
                let _ = tx.send((ticket.generation, result));
            });
        }
        drop(tx);

        // Act: apply completions in arrival order
        let mut arrival = Vec::new();
        while let Some((generation, result)) = rx.recv().await {
            arrival.push(generation);
            pipeline.complete(generation, result);
        }

        // Assert
        assert_eq!(arrival, vec![2, 1]);
        assert_eq!(pipeline.results()[0].title, "superman");
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![String::from("search:batman"), String::from("search:superman")]
        );
    }

    #[tokio::test]
    async fn test_fetch_page_routes_by_query() {
        // Arrange
        let api = ScriptedApi::default();

        // Act
        fetch_page(&api, &MovieQuery::Discover, "en-US").await.unwrap();
        fetch_page(&api, &MovieQuery::Search(String::from("Amélie")), "fr-FR")
            .await
            .unwrap();

        // Assert
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![String::from("discover"), String::from("search:Amélie")]
        );
    }
}
