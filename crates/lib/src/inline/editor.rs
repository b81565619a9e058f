//! An inline editor: a text container bound to a renderer and a selection.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use tracing::{debug, error, warn};

use super::{InlineRange, LineRenderer, RangeService, RenderConfig, RenderError, RenderService, RenderState};
use crate::{crdt::TextRef, observable::Subscription};

struct EditorInner<R> {
    text: TextRef,
    render: RenderService<R>,
    range: RangeService,
}

impl<R: LineRenderer> EditorInner<R> {
    /// One cycle: render, then put the selection back where it belongs.
    fn refresh(&self) -> Result<(), RenderError> {
        let result = self.render.request_render(&self.text);
        if self.render.state() == RenderState::Idle {
            match self.text.doc().transact() {
                Ok(txn) => {
                    self.range.sync_range(&txn, &self.text);
                }
                Err(err) => warn!(error = %err, "selection not resynced"),
            }
        }
        result
    }
}

/// Keeps a [`LineRenderer`] and a selection in sync with a [`TextRef`].
///
/// Every mutation of the text, local or remote, triggers a render cycle
/// followed by a selection resync.
pub struct InlineEditor<R> {
    inner: Rc<EditorInner<R>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<R: LineRenderer + 'static> InlineEditor<R> {
    pub fn mount(text: TextRef, renderer: R) -> Result<Self, RenderError> {
        Self::mount_with_config(text, renderer, RenderConfig::default())
    }

    /// Binds `renderer` to `text` and renders the current content.
    pub fn mount_with_config(
        text: TextRef,
        renderer: R,
        config: RenderConfig,
    ) -> Result<Self, RenderError> {
        let inner = Rc::new(EditorInner {
            text,
            render: RenderService::with_config(renderer, config),
            range: RangeService::new(),
        });

        let weak: Weak<EditorInner<R>> = Rc::downgrade(&inner);
        let subscription = inner.text.observe(move |_| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(err) = inner.refresh() {
                error!(error = %err, "render after text change failed");
            }
        });
        inner.refresh()?;
        debug!(lines = inner.render.lines().len(), "inline editor mounted");

        Ok(Self {
            inner,
            subscription: RefCell::new(Some(subscription)),
        })
    }

    pub fn text(&self) -> &TextRef {
        &self.inner.text
    }

    pub fn range(&self) -> Option<InlineRange> {
        self.inner.range.range()
    }

    /// Sets the selection. Fails if a write transaction on the document is
    /// still open.
    pub fn set_range(&self, range: Option<InlineRange>) -> crate::Result<()> {
        let txn = self.inner.text.doc().transact()?;
        self.inner.range.set_range(&txn, &self.inner.text, range);
        Ok(())
    }

    pub fn render_state(&self) -> RenderState {
        self.inner.render.state()
    }

    /// Explicit re-render, independent of any mutation.
    pub fn rerender(&self) -> Result<(), RenderError> {
        self.inner.refresh()
    }

    /// Replaces the selected text with `content` and leaves a caret after
    /// the inserted text.
    pub fn insert_text(&self, range: InlineRange, content: &str) -> crate::Result<()> {
        let text = &self.inner.text;
        {
            let mut txn = text.doc().transact_mut()?;
            if !range.is_collapsed() {
                text.delete(&mut txn, range.index, range.length)?;
            }
            text.insert(&mut txn, range.index, content)?;
        }
        self.set_range(Some(InlineRange::caret(range.index + content.encode_utf16().count())))
    }

    pub fn with_renderer<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        self.inner.render.with_renderer(f)
    }

    /// Resolves once the current render cycle, if any, is done.
    pub async fn update_complete(&self) -> u64 {
        self.inner.render.update_complete().await
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    /// Stops following the text. The renderer keeps whatever it shows.
    pub fn unmount(&self) {
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
            debug!("inline editor unmounted");
        }
    }
}
