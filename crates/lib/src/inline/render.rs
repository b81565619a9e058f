//! Render cycle: keeps a line renderer in step with a text container.

use std::cell::{Cell, RefCell};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::{Line, delta_to_lines};
use crate::crdt::TextRef;

/// Host-side failures while rendering.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The host refused to update one line
    #[error("Failed to render line {key}: {reason}")]
    LineRejected { key: usize, reason: String },

    /// The host failed outside of any particular line
    #[error("Renderer failed: {reason}")]
    Host { reason: String },

    /// The text could not be read, typically because a write transaction
    /// on its document is still open
    #[error("Cannot read text: {reason}")]
    Document { reason: String },
}

impl RenderError {
    pub fn line_rejected(key: usize, reason: impl Into<String>) -> Self {
        RenderError::LineRejected {
            key,
            reason: reason.into(),
        }
    }

    pub fn host(reason: impl Into<String>) -> Self {
        RenderError::Host {
            reason: reason.into(),
        }
    }
}

impl From<RenderError> for crate::Error {
    fn from(err: RenderError) -> Self {
        crate::Error::Render(err)
    }
}

/// The host rendering library.
///
/// Lines are addressed by key. A renderer only sees `update_line` for lines
/// that changed since the previous pass, and `truncate` when lines were
/// removed from the end.
pub trait LineRenderer {
    fn update_line(&mut self, key: usize, line: &Line) -> Result<(), RenderError>;

    /// Drops every rendered line with key `>= len`.
    fn truncate(&mut self, len: usize) -> Result<(), RenderError>;

    /// Drops everything rendered so far.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering,
}

/// Render cycle configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Upper bound on passes per request when mutations keep arriving while
    /// rendering.
    pub max_passes: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

/// Drives a [`LineRenderer`] from the content of a [`TextRef`].
///
/// Rendering is synchronous. A request made while a pass is in progress
/// (typically from a mutation the renderer itself caused) is folded into one
/// more pass of the running cycle instead of re-entering the renderer.
pub struct RenderService<R> {
    renderer: RefCell<R>,
    rendered: RefCell<Vec<Line>>,
    state: Cell<RenderState>,
    pending: Cell<bool>,
    config: RenderConfig,
    completed: watch::Sender<u64>,
}

impl<R: LineRenderer> RenderService<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, RenderConfig::default())
    }

    pub fn with_config(renderer: R, config: RenderConfig) -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            renderer: RefCell::new(renderer),
            rendered: RefCell::new(Vec::new()),
            state: Cell::new(RenderState::Idle),
            pending: Cell::new(false),
            config,
            completed,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state.get()
    }

    /// Lines as of the last completed pass.
    pub fn lines(&self) -> Vec<Line> {
        self.rendered.borrow().clone()
    }

    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.renderer.borrow())
    }

    /// Renders the current content of `text`.
    ///
    /// A failing incremental pass is recovered by clearing the renderer and
    /// rendering every line again. Only a failure of that rebuild is
    /// returned.
    pub fn request_render(&self, text: &TextRef) -> Result<(), RenderError> {
        if self.state.get() == RenderState::Rendering {
            self.pending.set(true);
            return Ok(());
        }
        self.state.set(RenderState::Rendering);

        let mut passes = 0;
        let result = loop {
            self.pending.set(false);
            passes += 1;
            let result = self.render_pass(text);
            if result.is_err() || !self.pending.get() {
                break result;
            }
            if passes >= self.config.max_passes {
                warn!(passes, "render requests still pending, giving up until next request");
                break result;
            }
        };

        self.pending.set(false);
        self.state.set(RenderState::Idle);
        self.completed.send_modify(|count| *count += 1);
        result
    }

    fn render_pass(&self, text: &TextRef) -> Result<(), RenderError> {
        // The read transaction is released before the renderer runs, so the
        // renderer may write to the text
        let delta = {
            let txn = text.doc().transact().map_err(|err| RenderError::Document {
                reason: err.to_string(),
            })?;
            text.to_delta(&txn)
        };
        let lines = delta_to_lines(&delta);
        match self.update(&lines) {
            Ok(updated) => {
                debug!(lines = lines.len(), updated, "rendered");
            }
            Err(err) => {
                warn!(error = %err, "incremental render failed, rebuilding");
                self.rendered.borrow_mut().clear();
                self.renderer.borrow_mut().clear();
                if let Err(err) = self.update(&lines) {
                    error!(error = %err, "full rebuild failed");
                    self.rendered.borrow_mut().clear();
                    return Err(err);
                }
            }
        }
        *self.rendered.borrow_mut() = lines;
        Ok(())
    }

    /// Pushes the lines that differ from the last pass. Returns how many
    /// were sent to the renderer.
    fn update(&self, lines: &[Line]) -> Result<usize, RenderError> {
        let previous = self.rendered.borrow();
        let mut renderer = self.renderer.borrow_mut();
        let mut updated = 0;
        for line in lines {
            if previous.get(line.key) != Some(line) {
                renderer.update_line(line.key, line)?;
                updated += 1;
            }
        }
        if previous.len() > lines.len() {
            renderer.truncate(lines.len())?;
        }
        Ok(updated)
    }

    /// Resolves once no render is in progress. Returns the number of
    /// completed render requests.
    pub async fn update_complete(&self) -> u64 {
        let mut completions = self.completed.subscribe();
        while self.state.get() == RenderState::Rendering {
            if completions.changed().await.is_err() {
                break;
            }
        }
        *completions.borrow()
    }

    /// A receiver that sees every completed render request.
    pub fn completions(&self) -> watch::Receiver<u64> {
        self.completed.subscribe()
    }
}
