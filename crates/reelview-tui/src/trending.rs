//! Weekly trending section.
//!
//! Fetched once when the home view mounts. A failure only hides the
//! section; it never surfaces an error on screen.

use anyhow::Result;
use reelview_api::tmdb::{MoviePage, MovieSummary, TmdbApi};

/// Number of trending movies shown.
pub const TRENDING_LIMIT: usize = 5;

/// State of the trending section.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TrendingSection {
    /// The one-shot fetch has not completed yet.
    #[default]
    Pending,
    /// Top movies, truncated to [`TRENDING_LIMIT`].
    Loaded(Vec<MovieSummary>),
    /// The fetch failed or returned nothing; the section is not drawn.
    Absent,
}

impl TrendingSection {
    /// Applies the result of the one-shot fetch.
    pub fn apply(&mut self, result: Result<MoviePage>) {
        *self = match result {
            Ok(page) => {
                let mut movies = page.results;
                movies.truncate(TRENDING_LIMIT);
                if movies.is_empty() {
                    Self::Absent
                } else {
                    Self::Loaded(movies)
                }
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "trending fetch failed, hiding section");
                Self::Absent
            }
        };
    }

    /// Movies to draw, or `None` when the section is hidden.
    #[must_use]
    pub fn movies(&self) -> Option<&[MovieSummary]> {
        match self {
            Self::Loaded(movies) => Some(movies),
            Self::Pending | Self::Absent => None,
        }
    }
}

/// Fetches this week's trending movies.
///
/// # Errors
///
/// Returns an error if the TMDB request fails.
pub async fn fetch_trending<A>(api: &A, language: &str) -> Result<MoviePage>
where
    A: TmdbApi + Sync + ?Sized,
{
    api.trending_movies(language).await
}
