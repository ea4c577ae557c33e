//! Interactive application: terminal setup and the async event loop.

/// Application state and input handling.
pub mod state;
mod ui;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use reelview_api::tmdb::TmdbApi;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::instrument;

use self::state::{AppState, Effect, Outcome, PipelineKind};
use crate::detail::fetch_details;
use crate::pipeline::{PipelineConfig, fetch_page};
use crate::trending::fetch_trending;

/// How long the input thread blocks before checking for shutdown.
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runtime settings of the interactive application.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Primary search pipeline tuning.
    pub search: PipelineConfig,
    /// Suggestions dropdown tuning.
    pub suggestions: PipelineConfig,
    /// TMDB response language (e.g. `en-US`).
    pub language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            search: PipelineConfig::search(),
            suggestions: PipelineConfig::suggestions(),
            language: String::from("en-US"),
        }
    }
}

/// Runs the interactive browser until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup, drawing or event handling fails.
#[instrument(skip_all)]
pub async fn run<A>(api: Arc<A>, settings: AppSettings) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
{
    let mut state = AppState::new(settings.search, settings.suggestions);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let mut tasks = Tasks::default();
    let result = run_event_loop(
        &mut terminal,
        &mut state,
        &mut tasks,
        &api,
        &settings.language,
    )
    .await;

    state.teardown();
    tasks.abort_all();

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    result
}

/// Main event loop.
async fn run_event_loop<A>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    tasks: &mut Tasks,
    api: &Arc<A>,
    language: &str,
) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
{
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let _reader = InputReader::spawn(input_tx);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let mut runner = Runner {
        api,
        tasks,
        outcomes: &outcome_tx,
        language,
    };

    for effect in state.mount() {
        runner.dispatch(effect);
    }

    loop {
        terminal
            .draw(|frame| ui::draw(frame, state))
            .context("failed to draw TUI")?;
        if state.should_quit {
            return Ok(());
        }

        let deadline = state.next_deadline();
        let mut effects = tokio::select! {
            event = input_rx.recv() => {
                let Some(event) = event else {
                    bail!("terminal input closed");
                };
                state.handle_event(event, Instant::now())
            }
            Some(outcome) = outcome_rx.recv() => state.apply(outcome),
            () = wait_until(deadline) => Vec::new(),
        };
        effects.extend(state.poll(Instant::now()));

        for effect in effects {
            runner.dispatch(effect);
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Handles of in-flight tasks, at most one per kind.
#[derive(Debug, Default)]
struct Tasks {
    search: Option<JoinHandle<()>>,
    suggestions: Option<JoinHandle<()>>,
    trending: Option<JoinHandle<()>>,
    detail: Option<JoinHandle<()>>,
    poster: Option<JoinHandle<()>>,
}

impl Tasks {
    /// Stores `handle` in `slot`, aborting the task it supersedes.
    fn replace(slot: &mut Option<JoinHandle<()>>, handle: JoinHandle<()>) {
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn abort(slot: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn pipeline(&mut self, kind: PipelineKind) -> &mut Option<JoinHandle<()>> {
        match kind {
            PipelineKind::Search => &mut self.search,
            PipelineKind::Suggestions => &mut self.suggestions,
        }
    }

    fn abort_all(&mut self) {
        for slot in [
            &mut self.search,
            &mut self.suggestions,
            &mut self.trending,
            &mut self.detail,
            &mut self.poster,
        ] {
            Self::abort(slot);
        }
    }
}

/// Turns effects into spawned tasks that report back over a channel.
struct Runner<'a, A> {
    api: &'a Arc<A>,
    tasks: &'a mut Tasks,
    outcomes: &'a UnboundedSender<Outcome>,
    language: &'a str,
}

impl<A> Runner<'_, A>
where
    A: TmdbApi + Send + Sync + 'static,
{
    fn dispatch(&mut self, effect: Effect) {
        let api = Arc::clone(self.api);
        let tx = self.outcomes.clone();
        let language = String::from(self.language);

        match effect {
            Effect::Fetch { pipeline, ticket } => {
                let handle = tokio::spawn(async move {
                    let result = fetch_page(api.as_ref(), &ticket.query, &language).await;
                    let _ = tx.send(Outcome::Page {
                        pipeline,
                        generation: ticket.generation,
                        result,
                    });
                });
                Tasks::replace(self.tasks.pipeline(pipeline), handle);
            }
            Effect::FetchTrending => {
                let handle = tokio::spawn(async move {
                    let result = fetch_trending(api.as_ref(), &language).await;
                    let _ = tx.send(Outcome::Trending(result));
                });
                Tasks::replace(&mut self.tasks.trending, handle);
            }
            Effect::FetchDetail(ticket) => {
                Tasks::abort(&mut self.tasks.poster);
                let handle = tokio::spawn(async move {
                    let result = fetch_details(api.as_ref(), ticket, &language).await;
                    let _ = tx.send(Outcome::Detail {
                        generation: ticket.generation,
                        result,
                    });
                });
                Tasks::replace(&mut self.tasks.detail, handle);
            }
            Effect::CancelDetail => {
                Tasks::abort(&mut self.tasks.detail);
                Tasks::abort(&mut self.tasks.poster);
            }
            Effect::ProbePoster { generation, url } => {
                let handle = tokio::spawn(async move {
                    let loadable = match api.probe_image(&url).await {
                        Ok(ok) => ok,
                        Err(e) => {
                            tracing::debug!(error = %format!("{e:#}"), url = %url, "poster probe failed");
                            false
                        }
                    };
                    let _ = tx.send(Outcome::Poster {
                        generation,
                        loadable,
                    });
                });
                Tasks::replace(&mut self.tasks.poster, handle);
            }
            Effect::OpenUrl(url) => {
                tracing::info!(url = %url, "opening in browser");
                if let Err(e) = open::that(&url) {
                    tracing::warn!(error = %e, url = %url, "failed to open browser");
                }
            }
        }
    }
}

/// Reads terminal events on a dedicated thread and forwards them.
struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputReader {
    fn spawn(tx: UnboundedSender<Event>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                match event::poll(INPUT_POLL_INTERVAL) {
                    Ok(false) => {}
                    Ok(true) => match event::read() {
                        Ok(ev) => {
                            if tx.send(ev).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to read terminal event");
                            break;
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to poll terminal events");
                        break;
                    }
                }
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            release_reader(handle);
        }
    }
}

/// How the input thread ended when the reader was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderExit {
    Finished,
    Panicked,
    Detached,
}

/// Joins the input thread only if it has already stopped; a thread still inside
/// `event::poll` is detached and sees the stop flag on its next tick.
fn release_reader(handle: thread::JoinHandle<()>) -> ReaderExit {
    if !handle.is_finished() {
        tracing::debug!("input reader still polling, detaching");
        return ReaderExit::Detached;
    }
    if handle.join().is_err() {
        tracing::error!("input reader thread panicked");
        return ReaderExit::Panicked;
    }
    ReaderExit::Finished
}
