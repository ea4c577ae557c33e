//! Null-safe formatting of TMDB fields for display.

use reelview_api::tmdb::MovieSummary;

/// Placeholder shown when a movie has no poster or the poster fails to load.
pub const NO_MOVIE_PLACEHOLDER: &str = "/no-movie.png";

/// Placeholder shown when a cast member has no profile image.
pub const NO_AVATAR_PLACEHOLDER: &str = "/no-avatar.png";

/// Text shown for a missing rating or year.
pub const NOT_AVAILABLE: &str = "N/A";

/// TMDB image CDN base.
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// YouTube watch page base.
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Image rendition requested from the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Poster rendition (`w500`).
    Poster,
    /// Cast profile rendition (`w185`).
    Profile,
    /// Full-size backdrop (`original`).
    Original,
}

impl ImageSize {
    /// CDN path segment for this size.
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Poster => "w500",
            Self::Profile => "w185",
            Self::Original => "original",
        }
    }
}

/// Builds a CDN URL for an image path, or `None` when there is no path.
#[must_use]
pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{IMAGE_BASE_URL}/{}{p}", size.segment()))
}

/// An image source that falls back to a fixed placeholder.
///
/// The placeholder is used both when the record has no image path and when
/// the remote image turns out to be unloadable ([`mark_broken`](Self::mark_broken)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    src: String,
    placeholder: &'static str,
}

impl ImageSlot {
    /// Creates a slot for an optional image path.
    #[must_use]
    pub fn new(path: Option<&str>, size: ImageSize, placeholder: &'static str) -> Self {
        let src = image_url(path, size).unwrap_or_else(|| String::from(placeholder));
        Self { src, placeholder }
    }

    /// Poster slot with the movie placeholder.
    #[must_use]
    pub fn poster(path: Option<&str>) -> Self {
        Self::new(path, ImageSize::Poster, NO_MOVIE_PLACEHOLDER)
    }

    /// Profile slot with the avatar placeholder.
    #[must_use]
    pub fn profile(path: Option<&str>) -> Self {
        Self::new(path, ImageSize::Profile, NO_AVATAR_PLACEHOLDER)
    }

    /// Current source (remote URL or placeholder path).
    #[must_use]
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Returns `true` if the slot currently shows its placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.src == self.placeholder
    }

    /// Swaps the source to the placeholder after a failed load.
    pub fn mark_broken(&mut self) {
        if !self.is_placeholder() {
            tracing::debug!(src = %self.src, "image failed to load, using placeholder");
            self.src = String::from(self.placeholder);
        }
    }
}

/// Formats a vote average with one decimal, or `"N/A"`.
///
/// TMDB reports unrated movies as `0`, which is treated as missing.
#[must_use]
pub fn rating_text(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v.is_finite() && v > 0.0 => one_decimal_half_up(v),
        _ => String::from(NOT_AVAILABLE),
    }
}

/// Rounds a positive value to one decimal, ties going up.
///
/// Works on the exact decimal expansion of `v`, so `7.25` gives `"7.3"` while
/// `0.15` (stored as `0.1499...`) gives `"0.1"`.
fn one_decimal_half_up(v: f64) -> String {
    let exact = format!("{v:.64}");
    let Some((whole, fraction)) = exact.split_once('.') else {
        return exact;
    };
    let mut digits = fraction.bytes().map(|b| u64::from(b.saturating_sub(b'0')));
    let tenth = digits.next().unwrap_or(0);
    let round_up = digits.next().unwrap_or(0) >= 5;
    let tenths = whole
        .parse::<u64>()
        .unwrap_or(0)
        .saturating_mul(10)
        .saturating_add(tenth)
        .saturating_add(u64::from(round_up));
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Extracts the leading year of a release date, or `"N/A"`.
#[must_use]
pub fn year_text(release_date: Option<&str>) -> String {
    release_date
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map_or_else(|| String::from(NOT_AVAILABLE), String::from)
}

/// Formats a runtime in minutes, or `"N/A"`.
#[must_use]
pub fn runtime_text(runtime: Option<u32>) -> String {
    runtime
        .filter(|m| *m > 0)
        .map_or_else(|| String::from(NOT_AVAILABLE), |m| format!("{m} min"))
}

/// YouTube watch URL for a trailer key.
#[must_use]
pub fn trailer_url(key: &str) -> String {
    format!("{YOUTUBE_WATCH_URL}{key}")
}

/// Display model for a movie in a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieCard {
    /// TMDB movie ID (link target).
    pub id: u64,
    /// Title.
    pub title: String,
    /// Poster source.
    pub poster: ImageSlot,
    /// Rating text.
    pub rating: String,
    /// Original language code.
    pub language: String,
    /// Release year text.
    pub year: String,
}

impl From<&MovieSummary> for MovieCard {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster: ImageSlot::poster(movie.poster_path.as_deref()),
            rating: rating_text(movie.vote_average),
            language: movie
                .original_language
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| String::from(NOT_AVAILABLE)),
            year: year_text(movie.release_date.as_deref()),
        }
    }
}

/// Display model for a ranked trending entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingCard {
    /// 1-based rank.
    pub rank: usize,
    /// TMDB movie ID (link target).
    pub id: u64,
    /// Title.
    pub title: String,
    /// Poster source.
    pub poster: ImageSlot,
}

impl TrendingCard {
    /// Builds the card for the movie at `index` (0-based) in the trending list.
    #[must_use]
    pub fn new(index: usize, movie: &MovieSummary) -> Self {
        Self {
            rank: index.saturating_add(1),
            id: movie.id,
            title: movie.title.clone(),
            poster: ImageSlot::poster(movie.poster_path.as_deref()),
        }
    }
}
