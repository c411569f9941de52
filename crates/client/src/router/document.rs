//! The live document the router renders into.

use std::sync::{Mutex, MutexGuard, PoisonError};

use scraper::Selector;

use bizdesk_core::Error;

use crate::page::{normalize_fragment, script_sources, select_outer, selector};

/// Visual phase of a page swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Old content sliding out.
    FadeOut,
    /// New content sliding in.
    FadeIn,
    /// Transition finished, content at rest.
    Settled,
}

/// Operations the router needs from the displayed document.
pub trait Document: Send + Sync {
    /// Replace the displayed content with a fetched body in one step.
    fn render(&self, body_markup: &str);

    /// Whether an external script is already part of the document.
    fn has_script(&self, src: &str) -> bool;

    /// Add an external script reference to the document.
    fn insert_script(&self, src: &str);

    /// Show the transition overlay, creating it on first use.
    fn show_overlay(&self);

    fn hide_overlay(&self);

    fn set_transition(&self, phase: TransitionPhase);

    /// Mark the navigation entry for `path` active and every other inactive.
    fn highlight_nav(&self, path: &str);
}

#[derive(Debug, Default)]
struct HeadlessState {
    body: String,
    scripts: Vec<String>,
    overlay_created: usize,
    overlay_visible: bool,
    phases: Vec<TransitionPhase>,
    active_nav: Option<String>,
    renders: usize,
}

/// In-memory document for headless sessions.
///
/// On render, the element matching the content selector is swapped when both
/// the current and the incoming markup contain one; otherwise the whole body
/// is replaced.
#[derive(Debug)]
pub struct HeadlessDocument {
    container: Selector,
    state: Mutex<HeadlessState>,
}

impl HeadlessDocument {
    /// Create a document showing `initial_body`.
    ///
    /// Scripts referenced by the initial markup count as already loaded.
    pub fn new(initial_body: &str, content_selector: &str) -> Result<Self, Error> {
        let container = selector(content_selector)?;
        let state = HeadlessState {
            body: normalize_fragment(initial_body),
            scripts: script_sources(initial_body),
            ..Default::default()
        };
        Ok(Self { container, state: Mutex::new(state) })
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full body markup.
    pub fn body(&self) -> String {
        self.lock().body.clone()
    }

    /// Markup of the content container, or the body when there is none.
    pub fn content(&self) -> String {
        let body = self.body();
        select_outer(&body, &self.container).unwrap_or(body)
    }

    /// Scripts in insertion order.
    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    /// How many times an overlay element was created.
    pub fn overlay_created(&self) -> usize {
        self.lock().overlay_created
    }

    pub fn overlay_visible(&self) -> bool {
        self.lock().overlay_visible
    }

    /// Every transition phase entered so far.
    pub fn phases(&self) -> Vec<TransitionPhase> {
        self.lock().phases.clone()
    }

    pub fn active_nav(&self) -> Option<String> {
        self.lock().active_nav.clone()
    }

    /// Number of completed renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }
}

impl Document for HeadlessDocument {
    fn render(&self, body_markup: &str) {
        let incoming = select_outer(body_markup, &self.container);
        let mut state = self.lock();
        let current = select_outer(&state.body, &self.container);

        state.body = match (incoming, current) {
            (Some(incoming), Some(current)) if state.body.contains(&current) => {
                state.body.replacen(&current, &incoming, 1)
            }
            _ => normalize_fragment(body_markup),
        };
        state.renders += 1;
    }

    fn has_script(&self, src: &str) -> bool {
        self.lock().scripts.iter().any(|s| s == src)
    }

    fn insert_script(&self, src: &str) {
        let mut state = self.lock();
        if !state.scripts.iter().any(|s| s == src) {
            state.scripts.push(src.to_string());
        }
    }

    fn show_overlay(&self) {
        let mut state = self.lock();
        if state.overlay_created == 0 {
            state.overlay_created = 1;
        }
        state.overlay_visible = true;
    }

    fn hide_overlay(&self) {
        self.lock().overlay_visible = false;
    }

    fn set_transition(&self, phase: TransitionPhase) {
        self.lock().phases.push(phase);
    }

    fn highlight_nav(&self, path: &str) {
        self.lock().active_nav = Some(path.to_string());
    }
}
