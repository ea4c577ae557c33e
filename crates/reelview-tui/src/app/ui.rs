//! Rendering of the home and detail views.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use super::state::{AppState, Focus, InputMode};
use crate::detail::{DetailState, DetailView};
use crate::format::{MovieCard, TrendingCard, rating_text, runtime_text, trailer_url, year_text};
use crate::pipeline::RequestState;
use crate::route::Route;

/// Draws the current route.
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    match state.navigator.current() {
        Route::Home => draw_home(frame, state),
        Route::Movie(_) => draw_detail(frame, state),
    }
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn border(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn card_line(card: &MovieCard) -> Line<'static> {
    Line::from(vec![
        Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}  ", card.year)),
        Span::styled(
            format!("\u{2605} {}", card.rating),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("  {}", card.language),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Placeholder text for non-ready request states.
fn status_paragraph<'a>(status: &RequestState, empty: &'a str, block: Block<'a>) -> Paragraph<'a> {
    let (text, style) = match status {
        RequestState::Idle => (String::new(), Style::default()),
        RequestState::Loading => (String::from("Loading..."), Style::default().fg(Color::DarkGray)),
        RequestState::Error(message) => (message.clone(), Style::default().fg(Color::Red)),
        RequestState::Empty | RequestState::Ready(_) => (String::from(empty), Style::default()),
    };
    Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: true })
        .block(block)
}

#[allow(clippy::indexing_slicing)]
fn draw_home(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search box
            Constraint::Min(5),    // lists
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_search_box(frame, chunks[0], state);

    let show_trending = state.trending.movies().is_some();
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(if show_trending {
            [
                Constraint::Percentage(25),
                Constraint::Percentage(45),
                Constraint::Percentage(30),
            ]
        } else {
            [
                Constraint::Length(0),
                Constraint::Percentage(65),
                Constraint::Percentage(35),
            ]
        })
        .split(chunks[1]);

    if show_trending {
        draw_trending(frame, main[0], state);
    } else {
        state.trending_area = None;
    }
    draw_results(frame, main[1], state);
    draw_preview(frame, main[2], state);
    draw_footer(frame, chunks[2], state);

    if state.dropdown_visible() {
        draw_dropdown(frame, chunks[0], state);
    } else {
        state.dropdown_area = None;
    }
}

fn draw_search_box(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let active = state.input_mode == InputMode::Search;
    let text = if state.query.is_empty() && !active {
        Span::styled(
            "Search through thousands of movies",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(state.query.clone())
    };
    let search = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search: / ")
            .border_style(border(active)),
    );
    frame.render_widget(search, area);
    state.search_area = Some(area);

    if active {
        let cursor_x = u16::try_from(state.query.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(area.x)
            .saturating_add(1);
        frame.set_cursor_position((
            cursor_x.min(area.right().saturating_sub(2)),
            area.y.saturating_add(1),
        ));
    }
}

fn draw_dropdown(frame: &mut Frame, search_area: Rect, state: &mut AppState) {
    let rows = match state.suggestions.state() {
        RequestState::Ready(movies) => movies.len(),
        _ => 1,
    };
    let below = frame.area().bottom().saturating_sub(search_area.bottom());
    let height = u16::try_from(rows)
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(below);
    let area = Rect::new(search_area.x, search_area.bottom(), search_area.width, height);
    frame.render_widget(Clear, area);
    state.dropdown_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Suggestions ")
        .border_style(Style::default().fg(Color::Yellow));

    if let RequestState::Ready(movies) = state.suggestions.state() {
        let items: Vec<ListItem> = movies
            .iter()
            .map(|m| ListItem::new(card_line(&MovieCard::from(m))))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(highlight());
        frame.render_stateful_widget(list, area, &mut state.suggestion_state);
    } else {
        let status = status_paragraph(state.suggestions.state(), "No matches.", block);
        frame.render_widget(status, area);
    }
}

fn draw_trending(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let Some(movies) = state.trending.movies() else {
        return;
    };
    let items: Vec<ListItem> = movies
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let card = TrendingCard::new(i, m);
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>2} ", card.rank),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(card.title),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Trending this week ")
                .border_style(border(state.focus == Focus::Trending)),
        )
        .highlight_style(highlight());
    frame.render_stateful_widget(list, area, &mut state.trending_state);
    state.trending_area = Some(area);
}

fn draw_results(frame: &mut Frame, area: Rect, state: &mut AppState) {
    let title = match state.search.settled_query() {
        Some(q) if !q.trim().is_empty() => format!(" Results for \"{q}\" "),
        _ => String::from(" Popular "),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border(state.focus == Focus::Results));
    state.results_area = Some(area);

    if let RequestState::Ready(movies) = state.search.state() {
        let items: Vec<ListItem> = movies
            .iter()
            .map(|m| ListItem::new(card_line(&MovieCard::from(m))))
            .collect();
        let list = List::new(items).block(block).highlight_style(highlight());
        frame.render_stateful_widget(list, area, &mut state.results_state);
    } else {
        let status = status_paragraph(state.search.state(), "No movies found.", block);
        frame.render_widget(status, area);
    }
}

fn draw_preview(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().borders(Borders::ALL).title(" Movie ");
    let Some(movie) = state.selected_movie() else {
        frame.render_widget(block, area);
        return;
    };
    let card = MovieCard::from(movie);
    let mut lines = vec![
        Line::from(Span::styled(
            card.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "\u{2605} {}  \u{2022}  {}  \u{2022}  {}",
            card.rating, card.language, card.year
        )),
        Line::from(Span::styled(
            format!("Poster: {}", card.poster.src()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::default(),
    ];
    if let Some(overview) = movie.overview.as_deref().filter(|o| !o.is_empty()) {
        lines.push(Line::from(String::from(overview)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Enter: details",
        Style::default().fg(Color::DarkGray),
    )));

    let preview = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(preview, area);
}

#[allow(clippy::indexing_slicing)]
fn draw_detail(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // title + tagline
            Constraint::Min(5),    // body
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    match state.detail.state() {
        DetailState::Ready(view) => {
            draw_detail_header(frame, chunks[0], view);
            let body = Paragraph::new(detail_lines(view))
                .wrap(Wrap { trim: false })
                .scroll((state.detail_scroll, 0))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, chunks[1]);
        }
        DetailState::Loading(id) => {
            let header = Paragraph::new(format!("Movie {id}"))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(header, chunks[0]);
            let body = Paragraph::new("Loading...")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, chunks[1]);
        }
        DetailState::Error(message) => {
            frame.render_widget(Block::default().borders(Borders::ALL), chunks[0]);
            let body = Paragraph::new(message.clone())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(" Error "));
            frame.render_widget(body, chunks[1]);
        }
        DetailState::Idle => {}
    }
    draw_footer(frame, chunks[2], state);
}

fn draw_detail_header(frame: &mut Frame, area: Rect, view: &DetailView) {
    let mut lines = vec![Line::from(Span::styled(
        view.details.title.clone(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(tagline) = view.details.tagline.as_deref().filter(|t| !t.is_empty()) {
        lines.push(Line::from(Span::styled(
            String::from(tagline),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    let header = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        String::from(title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Body lines of the detail view.
fn detail_lines(view: &DetailView) -> Vec<Line<'static>> {
    let details = &view.details;
    let dim = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        Line::from(format!(
            "\u{2605} {}  \u{2022}  {}  \u{2022}  {}",
            rating_text(details.vote_average),
            year_text(details.release_date.as_deref()),
            runtime_text(details.runtime),
        )),
        Line::from(Span::styled(format!("Poster: {}", view.poster.src()), dim)),
    ];
    if let Some(backdrop) = &view.backdrop {
        lines.push(Line::from(Span::styled(format!("Backdrop: {backdrop}"), dim)));
    }
    if !details.genres.is_empty() {
        let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        lines.push(Line::from(format!("Genres: {}", genres.join(", "))));
    }

    lines.push(Line::default());
    lines.push(section("Overview"));
    lines.push(Line::from(
        details
            .overview
            .clone()
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| String::from("No overview available.")),
    ));

    if !view.cast.is_empty() {
        lines.push(Line::default());
        lines.push(section("Top Cast"));
        for member in &view.cast {
            let mut spans = vec![Span::styled(
                member.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if !member.character.is_empty() {
                spans.push(Span::raw(format!(" as {}", member.character)));
            }
            spans.push(Span::styled(format!("  {}", member.profile.src()), dim));
            lines.push(Line::from(spans));
        }
    }

    if let Some(trailer) = &view.trailer {
        lines.push(Line::default());
        lines.push(section("Trailer"));
        lines.push(Line::from(format!(
            "{}: {}",
            trailer.name,
            trailer_url(&trailer.key)
        )));
    }
    lines
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let help = match (state.navigator.current(), state.input_mode) {
        (Route::Home, InputMode::Search) => {
            "Type to search | \u{2191}\u{2193}: suggestions | Enter: open | Esc/Tab: close"
        }
        (Route::Home, InputMode::Normal) => {
            "/: search  Tab: switch list  \u{2191}\u{2193}/j/k: move  Enter: details  q: quit"
        }
        (Route::Movie(_), _) => {
            if state.detail.view().is_some_and(|v| v.trailer.is_some()) {
                "Esc/b: back  \u{2191}\u{2193}/j/k: scroll  t: watch trailer  q: quit"
            } else {
                "Esc/b: back  \u{2191}\u{2193}/j/k: scroll  q: quit"
            }
        }
    };
    let footer = Paragraph::new(Line::from(help)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
