//! API client library for reelview.
//!
//! Provides the TMDB API client used by the terminal UI and the CLI.

/// TMDB API client.
pub mod tmdb;
