//! TMDB API response types and request parameters.

use serde::Deserialize;

// --- Movie listings ---

/// Paged movie listing returned by `search/movie`, `discover/movie`
/// and `trending/movie/week`.
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Movies on this page, in API order.
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A single movie as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default)]
    pub title: String,
    /// Poster image path (e.g. `/abc.jpg`).
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Vote average (0.0 when nobody voted).
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Release date (YYYY-MM-DD, empty or null when unknown).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Original language (ISO 639-1).
    #[serde(default)]
    pub original_language: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
}

// --- Movie details ---

/// Response from `movie/{movie_id}?append_to_response=credits,videos`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default)]
    pub title: String,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: Option<f64>,
    /// Release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Appended credits.
    #[serde(default)]
    pub credits: Option<Credits>,
    /// Appended videos.
    #[serde(default)]
    pub videos: Option<VideoList>,
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

/// Appended `credits` sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Credits {
    /// Cast in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

/// A single cast credit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Actor name.
    #[serde(default)]
    pub name: String,
    /// Character name.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Appended `videos` sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct VideoList {
    /// Videos attached to the movie.
    #[serde(default)]
    pub results: Vec<Video>,
}

/// A video attached to a movie (trailer, teaser, clip, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Video {
    /// Key on the hosting site (YouTube video ID).
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Hosting site (e.g. "YouTube", "Vimeo").
    #[serde(default)]
    pub site: String,
    /// Video type (e.g. "Trailer", "Teaser", "Featurette").
    #[serde(rename = "type", default)]
    pub video_type: String,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    pub status_code: u32,
    /// Error message.
    pub status_message: String,
    /// Success flag (always false for errors).
    #[allow(dead_code)]
    #[serde(default)]
    pub success: bool,
}

// --- Request Parameters ---

/// Parameters for the `search/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: String::from("en-US"),
            page: 1,
            include_adult: false,
        }
    }

    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Parameters for the `discover/movie` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverMovieParams {
    /// Sort order (default: "popularity.desc").
    pub sort_by: String,
    /// Response language (default: "en-US").
    pub language: String,
    /// Result page (default: 1).
    pub page: u32,
}

impl Default for DiscoverMovieParams {
    fn default() -> Self {
        Self {
            sort_by: String::from("popularity.desc"),
            language: String::from("en-US"),
            page: 1,
        }
    }
}

impl DiscoverMovieParams {
    /// Sets the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
