//! Terminal UI components for reelview.
//!
//! The search and detail pipelines are plain state machines driven by
//! explicit instants and fetch completions; [`app`] wires them to a
//! `ratatui` terminal and a `tokio` runtime.

/// Interactive terminal application.
pub mod app;
/// Quiescence-window debouncing.
pub mod debounce;
/// Movie detail fetch and view model.
pub mod detail;
/// Null-safe display formatting and image fallbacks.
pub mod format;
/// Debounced, last-request-wins movie search pipeline.
pub mod pipeline;
/// Home and detail routes with history.
pub mod route;
/// One-shot weekly trending section.
pub mod trending;
