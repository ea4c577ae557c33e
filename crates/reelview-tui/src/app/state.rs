//! Application state and input handling.
//!
//! [`AppState`] never performs I/O. Input and completions are fed in, and the
//! work the runtime must start is returned as a list of [`Effect`]s.

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::ListState;
use reelview_api::tmdb::{MovieDetails, MoviePage, MovieSummary};
use tokio::time::Instant;

use crate::detail::{DetailPage, DetailTicket};
use crate::format::trailer_url;
use crate::pipeline::{FetchTicket, PipelineConfig, RequestState, SearchPipeline};
use crate::route::{Navigator, Route};
use crate::trending::TrendingSection;

/// Input mode of the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys navigate lists.
    Normal,
    /// Keys edit the query.
    Search,
}

/// List focused on the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Weekly trending list.
    Trending,
    /// Search (or popular) results.
    Results,
}

/// Identifies one of the two search pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Primary result list.
    Search,
    /// Suggestions dropdown.
    Suggestions,
}

/// Work requested from the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a movie page; supersedes the pipeline's in-flight request.
    Fetch {
        /// Pipeline the result belongs to.
        pipeline: PipelineKind,
        /// Request and its generation.
        ticket: FetchTicket,
    },
    /// Fetch the weekly trending list.
    FetchTrending,
    /// Fetch a movie record; supersedes any in-flight detail request.
    FetchDetail(DetailTicket),
    /// Abort the in-flight detail request.
    CancelDetail,
    /// Check that the detail poster can be loaded.
    ProbePoster {
        /// Detail generation the check belongs to.
        generation: u64,
        /// Poster URL.
        url: String,
    },
    /// Open a URL in the system browser.
    OpenUrl(String),
}

/// Completed work reported back by the runtime.
#[derive(Debug)]
pub enum Outcome {
    /// A movie page fetch finished.
    Page {
        /// Pipeline that issued the request.
        pipeline: PipelineKind,
        /// Generation of the request.
        generation: u64,
        /// Response.
        result: Result<MoviePage>,
    },
    /// The trending fetch finished.
    Trending(Result<MoviePage>),
    /// A detail fetch finished.
    Detail {
        /// Generation of the request.
        generation: u64,
        /// Response.
        result: Result<MovieDetails>,
    },
    /// A poster check finished.
    Poster {
        /// Detail generation the check belongs to.
        generation: u64,
        /// Whether the image responded with success.
        loadable: bool,
    },
}

/// State of the interactive application.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct AppState {
    /// Route history.
    pub navigator: Navigator,
    /// Raw query text.
    pub query: String,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Focused home list.
    pub focus: Focus,
    /// Primary search pipeline.
    pub search: SearchPipeline,
    /// Suggestions pipeline.
    pub suggestions: SearchPipeline,
    /// Whether the dropdown may be shown.
    pub suggestions_open: bool,
    /// Dropdown selection.
    pub suggestion_state: ListState,
    /// Weekly trending section.
    pub trending: TrendingSection,
    /// Trending selection.
    pub trending_state: ListState,
    /// Result list selection.
    pub results_state: ListState,
    /// Detail page.
    pub detail: DetailPage,
    /// Vertical scroll of the detail body.
    pub detail_scroll: u16,
    /// Where the dropdown was last drawn.
    pub dropdown_area: Option<Rect>,
    /// Where the search box was last drawn.
    pub search_area: Option<Rect>,
    /// Where the result list was last drawn.
    pub results_area: Option<Rect>,
    /// Where the trending list was last drawn.
    pub trending_area: Option<Rect>,
    /// Set when the user asked to exit.
    pub should_quit: bool,
}

impl AppState {
    /// Creates the state for a fresh session.
    #[must_use]
    pub fn new(search: PipelineConfig, suggestions: PipelineConfig) -> Self {
        Self {
            navigator: Navigator::default(),
            query: String::new(),
            input_mode: InputMode::Normal,
            focus: Focus::Results,
            search: SearchPipeline::new("search", search),
            suggestions: SearchPipeline::new("suggestions", suggestions),
            suggestions_open: false,
            suggestion_state: ListState::default(),
            trending: TrendingSection::default(),
            trending_state: ListState::default(),
            results_state: ListState::default(),
            detail: DetailPage::default(),
            detail_scroll: 0,
            dropdown_area: None,
            search_area: None,
            results_area: None,
            trending_area: None,
            should_quit: false,
        }
    }

    /// Starts the home view: trending plus the initial (blank) query.
    pub fn mount(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::FetchTrending];
        if let Some(ticket) = self.search.mount() {
            effects.push(Effect::Fetch {
                pipeline: PipelineKind::Search,
                ticket,
            });
        }
        if let Some(ticket) = self.suggestions.mount() {
            effects.push(Effect::Fetch {
                pipeline: PipelineKind::Suggestions,
                ticket,
            });
        }
        effects
    }

    /// Cancels pending edits and orphans every in-flight request.
    pub fn teardown(&mut self) {
        self.search.cancel();
        self.suggestions.cancel();
        self.detail.close();
    }

    /// Handles one terminal event.
    pub fn handle_event(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => Vec::new(),
        }
    }

    /// Emits fetches for queries whose debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(ticket) = self.search.poll(now) {
            effects.push(Effect::Fetch {
                pipeline: PipelineKind::Search,
                ticket,
            });
        }
        if let Some(ticket) = self.suggestions.poll(now) {
            effects.push(Effect::Fetch {
                pipeline: PipelineKind::Suggestions,
                ticket,
            });
        }
        effects
    }

    /// Earliest instant at which [`poll`](Self::poll) may emit.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.search.deadline(), self.suggestions.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Applies a completion reported by the runtime.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Page {
                pipeline: PipelineKind::Search,
                generation,
                result,
            } => {
                if self.search.complete(generation, result) {
                    let first = (!self.search.results().is_empty()).then_some(0);
                    self.results_state.select(first);
                }
            }
            Outcome::Page {
                pipeline: PipelineKind::Suggestions,
                generation,
                result,
            } => {
                if self.suggestions.complete(generation, result) {
                    self.suggestion_state.select(None);
                }
            }
            Outcome::Trending(result) => {
                self.trending.apply(result);
                let first = self.trending.movies().map(|_| 0);
                self.trending_state.select(first);
                if first.is_none() {
                    self.focus = Focus::Results;
                }
            }
            Outcome::Detail { generation, result } => {
                if self.detail.complete(generation, result)
                    && let Some(view) = self.detail.view()
                    && !view.poster.is_placeholder()
                {
                    return vec![Effect::ProbePoster {
                        generation,
                        url: String::from(view.poster.src()),
                    }];
                }
            }
            Outcome::Poster {
                generation,
                loadable,
            } => self.detail.poster_checked(generation, loadable),
        }
        Vec::new()
    }

    /// Whether the suggestions dropdown is drawn.
    #[must_use]
    pub fn dropdown_visible(&self) -> bool {
        self.input_mode == InputMode::Search
            && self.suggestions_open
            && *self.suggestions.state() != RequestState::Idle
    }

    /// Movie under the cursor of the focused home list.
    #[must_use]
    pub fn selected_movie(&self) -> Option<&MovieSummary> {
        match self.focus {
            Focus::Trending => self
                .trending
                .movies()?
                .get(self.trending_state.selected()?),
            Focus::Results => self.search.results().get(self.results_state.selected()?),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Vec::new();
        }
        // Chords are not text or shortcuts; Shift is still typed.
        if matches!(key.code, KeyCode::Char(_))
            && key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return Vec::new();
        }
        match (self.navigator.current(), self.input_mode) {
            (Route::Home, InputMode::Search) => self.handle_search_key(key.code, now),
            (Route::Home, InputMode::Normal) => self.handle_home_key(key.code),
            (Route::Movie(_), _) => self.handle_detail_key(key.code),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, now: Instant) -> Vec<Effect> {
        match code {
            KeyCode::Char(c) => {
                self.query.push(c);
                self.query_changed(now);
            }
            KeyCode::Backspace => {
                if self.query.pop().is_some() {
                    self.query_changed(now);
                }
            }
            KeyCode::Down => step(
                &mut self.suggestion_state,
                self.suggestions.results().len(),
                true,
            ),
            KeyCode::Up => step(
                &mut self.suggestion_state,
                self.suggestions.results().len(),
                false,
            ),
            KeyCode::Enter => {
                if self.dropdown_visible()
                    && let Some(movie) = self
                        .suggestion_state
                        .selected()
                        .and_then(|i| self.suggestions.results().get(i))
                {
                    let id = movie.id;
                    return self.open_movie(id);
                }
                self.leave_search();
            }
            KeyCode::Esc | KeyCode::Tab => self.leave_search(),
            _ => {}
        }
        Vec::new()
    }

    fn handle_home_key(&mut self, code: KeyCode) -> Vec<Effect> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/' | 'i') => self.enter_search(),
            KeyCode::Tab => self.toggle_focus(),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(false),
            KeyCode::Enter => {
                if let Some(id) = self.selected_movie().map(|m| m.id) {
                    return self.open_movie(id);
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Vec<Effect> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('b') => {
                return self.go_back();
            }
            KeyCode::Char('t') => {
                if let Some(trailer) = self.detail.view().and_then(|v| v.trailer.as_ref()) {
                    return vec![Effect::OpenUrl(trailer_url(&trailer.key))];
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left)
            || self.navigator.current() != Route::Home
        {
            return Vec::new();
        }
        let pos = Position::new(mouse.column, mouse.row);

        if self.dropdown_visible()
            && let Some(area) = self.dropdown_area
            && area.contains(pos)
        {
            let id = row_at(area, 0, pos.y)
                .and_then(|i| self.suggestions.results().get(i))
                .map(|m| m.id);
            return id.map_or_else(Vec::new, |id| self.open_movie(id));
        }
        if self.search_area.is_some_and(|a| a.contains(pos)) {
            self.enter_search();
            return Vec::new();
        }

        // Anywhere else dismisses the dropdown.
        self.leave_search();
        let clicked = [
            (Focus::Results, self.results_area, &self.results_state),
            (Focus::Trending, self.trending_area, &self.trending_state),
        ]
        .into_iter()
        .find_map(|(focus, area, list)| {
            let area = area.filter(|a| a.contains(pos))?;
            Some((focus, row_at(area, list.offset(), pos.y)?))
        });
        if let Some((focus, index)) = clicked {
            self.focus = focus;
            match focus {
                Focus::Results => self.results_state.select(Some(index)),
                Focus::Trending => self.trending_state.select(Some(index)),
            }
            if let Some(id) = self.selected_movie().map(|m| m.id) {
                return self.open_movie(id);
            }
        }
        Vec::new()
    }

    fn query_changed(&mut self, now: Instant) {
        self.search.on_input(&self.query, now);
        self.suggestions.on_input(&self.query, now);
        self.suggestions_open = true;
        self.suggestion_state.select(None);
    }

    fn enter_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.suggestions_open = true;
    }

    fn leave_search(&mut self) {
        self.input_mode = InputMode::Normal;
        self.suggestions_open = false;
        self.suggestion_state.select(None);
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Results if self.trending.movies().is_some() => Focus::Trending,
            Focus::Results | Focus::Trending => Focus::Results,
        };
    }

    fn move_cursor(&mut self, down: bool) {
        match self.focus {
            Focus::Trending => {
                let len = self.trending.movies().map_or(0, <[MovieSummary]>::len);
                step(&mut self.trending_state, len, down);
            }
            Focus::Results => step(&mut self.results_state, self.search.results().len(), down),
        }
    }

    pub(super) fn open_movie(&mut self, movie_id: u64) -> Vec<Effect> {
        self.leave_search();
        self.navigator.push(Route::Movie(movie_id));
        self.load_movie(movie_id)
    }

    fn load_movie(&mut self, movie_id: u64) -> Vec<Effect> {
        self.detail_scroll = 0;
        vec![Effect::FetchDetail(self.detail.open(movie_id))]
    }

    fn go_back(&mut self) -> Vec<Effect> {
        if !self.navigator.back() {
            return Vec::new();
        }
        self.detail.close();
        let mut effects = vec![Effect::CancelDetail];
        if let Route::Movie(id) = self.navigator.current() {
            effects.extend(self.load_movie(id));
        }
        effects
    }
}

/// Moves a list selection one step, clamped to `len`.
fn step(list: &mut ListState, len: usize, down: bool) {
    if len == 0 {
        list.select(None);
        return;
    }
    let next = match (list.selected(), down) {
        (None, _) => 0,
        (Some(i), true) => i.saturating_add(1).min(len.saturating_sub(1)),
        (Some(i), false) => i.saturating_sub(1),
    };
    list.select(Some(next));
}

/// Item index under screen row `row` of a bordered list drawn in `area`.
fn row_at(area: Rect, offset: usize, row: u16) -> Option<usize> {
    let inner_top = area.y.checked_add(1)?;
    let rel = row.checked_sub(inner_top)?;
    if rel >= area.height.saturating_sub(2) {
        return None;
    }
    offset.checked_add(usize::from(rel))
}
