//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints
//! (search, discover, trending, and details with appended credits/videos).

mod api;
mod client;
mod error;
mod rate_limiter;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use error::{TmdbError, user_message};
pub use types::{
    CastMember, Credits, DiscoverMovieParams, Genre, MovieDetails, MoviePage, MovieSummary,
    SearchMovieParams, Video, VideoList,
};
