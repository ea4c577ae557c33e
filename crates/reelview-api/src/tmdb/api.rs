//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

use super::types::{DiscoverMovieParams, MovieDetails, MoviePage, SearchMovieParams};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Searches for movies by keyword.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn search_movies(&self, params: &SearchMovieParams) -> Result<MoviePage>;

    /// Lists movies through `discover/movie` (popularity order by default).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn discover_movies(&self, params: &DiscoverMovieParams) -> Result<MoviePage>;

    /// Lists this week's trending movies.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn trending_movies(&self, language: &str) -> Result<MoviePage>;

    /// Fetches one movie with its credits and videos appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64, language: &str) -> Result<MovieDetails>;

    /// Checks whether an image URL can be loaded (HEAD request, 2xx).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the request cannot be sent.
    async fn probe_image(&self, url: &str) -> Result<bool>;
}
