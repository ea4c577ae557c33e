//! Movie detail page: fetch, trailer selection and view model.

use anyhow::Result;
use reelview_api::tmdb::{CastMember, MovieDetails, TmdbApi, Video, user_message};

use crate::format::{ImageSize, ImageSlot, image_url};

/// Number of cast members shown on the detail page.
pub const TOP_CAST: usize = 6;

/// Picks the first YouTube trailer, if any.
#[must_use]
pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| v.video_type == "Trailer" && v.site == "YouTube")
}

/// A cast entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastCard {
    /// Actor name.
    pub name: String,
    /// Character name (empty when unknown).
    pub character: String,
    /// Profile image source.
    pub profile: ImageSlot,
}

impl From<&CastMember> for CastCard {
    fn from(member: &CastMember) -> Self {
        Self {
            name: member.name.clone(),
            character: member.character.clone().unwrap_or_default(),
            profile: ImageSlot::profile(member.profile_path.as_deref()),
        }
    }
}

/// Everything the detail view draws for one movie.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    /// The fetched record.
    pub details: MovieDetails,
    /// Poster source.
    pub poster: ImageSlot,
    /// Backdrop URL, when the movie has one.
    pub backdrop: Option<String>,
    /// First YouTube trailer.
    pub trailer: Option<Video>,
    /// First [`TOP_CAST`] cast members.
    pub cast: Vec<CastCard>,
}

impl From<MovieDetails> for DetailView {
    fn from(details: MovieDetails) -> Self {
        let trailer = details
            .videos
            .as_ref()
            .and_then(|v| select_trailer(&v.results))
            .cloned();
        let cast = details
            .credits
            .as_ref()
            .map(|c| c.cast.iter().take(TOP_CAST).map(CastCard::from).collect())
            .unwrap_or_default();
        Self {
            poster: ImageSlot::poster(details.poster_path.as_deref()),
            backdrop: image_url(details.backdrop_path.as_deref(), ImageSize::Original),
            trailer,
            cast,
            details,
        }
    }
}

/// State of the detail page.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    /// No movie is open.
    #[default]
    Idle,
    /// The record for this movie ID is being fetched.
    Loading(u64),
    /// The fetch failed; carries a user-facing message.
    Error(String),
    /// The record is ready.
    Ready(Box<DetailView>),
}

/// A detail request tagged with its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailTicket {
    /// Generation that must still be current when the response arrives.
    pub generation: u64,
    /// Movie to fetch.
    pub movie_id: u64,
}

/// Detail page controller: one fetch per opened movie, stale responses dropped.
#[derive(Debug, Default)]
pub struct DetailPage {
    generation: u64,
    state: DetailState,
}

impl DetailPage {
    /// Opens a movie and returns the request to send.
    pub fn open(&mut self, movie_id: u64) -> DetailTicket {
        self.generation = self.generation.wrapping_add(1);
        self.state = DetailState::Loading(movie_id);
        tracing::debug!(movie_id, generation = self.generation, "opening movie");
        DetailTicket {
            generation: self.generation,
            movie_id,
        }
    }

    /// Applies a completed fetch. Returns `false` for stale responses.
    pub fn complete(&mut self, generation: u64, result: Result<MovieDetails>) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale detail");
            return false;
        }
        self.state = match result {
            Ok(details) => DetailState::Ready(Box::new(DetailView::from(details))),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "detail fetch failed");
                DetailState::Error(user_message(&e))
            }
        };
        true
    }

    /// Records the result of a poster load check for the current movie.
    pub fn poster_checked(&mut self, generation: u64, loadable: bool) {
        if generation != self.generation || loadable {
            return;
        }
        if let DetailState::Ready(view) = &mut self.state {
            view.poster.mark_broken();
        }
    }

    /// Discards the page (navigation away); in-flight responses become stale.
    pub fn close(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = DetailState::Idle;
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &DetailState {
        &self.state
    }

    /// Ready view, if any.
    #[must_use]
    pub fn view(&self) -> Option<&DetailView> {
        match &self.state {
            DetailState::Ready(view) => Some(view),
            _ => None,
        }
    }

    /// Generation of the most recent request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Fetches one movie with credits and videos.
///
/// # Errors
///
/// Returns an error if the TMDB request fails.
pub async fn fetch_details<A>(api: &A, ticket: DetailTicket, language: &str) -> Result<MovieDetails>
where
    A: TmdbApi + Sync + ?Sized,
{
    api.movie_details(ticket.movie_id, language).await
}
