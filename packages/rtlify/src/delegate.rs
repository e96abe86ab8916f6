//! Child engines for embedded frames
//!
//! Every same-origin frame gets its own [`Engine`] over the frame's document. A child never
//! delegates further and only starts scanning once its frame reports loaded. Frames whose
//! document is out of reach are skipped.

use std::rc::Rc;

use rtlify_dom::{Document, NodeRef};
use rtlify_traits::{Clock, ShellProvider};

use crate::{Engine, EngineConfig, EngineError, Tick};

pub(crate) struct FrameDelegate {
    frame: NodeRef,
    engine: Engine,
    /// Enable the child engine as soon as the frame has loaded
    pending_scan: bool,
}

impl FrameDelegate {
    pub(crate) fn is_loaded(&self, doc: &Document) -> bool {
        doc.resolve(self.frame)
            .is_some_and(|node| doc.is_frame_loaded(node.id))
    }

    /// Start the child engine if the frame has loaded and a scan is owed
    fn start_if_loaded(&mut self, loaded: bool) {
        if !self.pending_scan || !loaded {
            return;
        }
        match self.engine.enable() {
            Ok(()) => {
                self.pending_scan = false;
                tracing::debug!("Started engine for frame {}", self.frame.id());
            }
            // Retried on the next tick
            Err(EngineError::DocumentBusy) => {}
            Err(err) => {
                self.pending_scan = false;
                tracing::warn!("Could not start engine for frame {}: {err}", self.frame.id());
            }
        }
    }

    pub(crate) fn drive(&mut self, loaded: bool) -> Tick {
        self.start_if_loaded(loaded);
        self.engine.tick()
    }

    /// Disable the child engine until the parent scans again
    pub(crate) fn suspend(&mut self) {
        self.pending_scan = false;
        if let Err(err) = self.engine.disable() {
            tracing::warn!("Could not disable engine for frame {}: {err}", self.frame.id());
        }
    }

    pub(crate) fn destroy(&mut self) {
        if let Err(err) = self.engine.destroy() {
            tracing::warn!("Could not destroy engine for frame {}: {err}", self.frame.id());
        }
    }
}

/// Reconcile child engines with the frames currently in `doc`
pub(crate) fn sync_frames(
    doc: &Document,
    frames: &mut Vec<FrameDelegate>,
    config: &EngineConfig,
    clock: &Rc<dyn Clock>,
    shell: &Rc<dyn ShellProvider>,
) {
    frames.retain_mut(|frame| {
        let connected = doc.is_connected(frame.frame);
        if !connected {
            frame.destroy();
        }
        connected
    });

    for frame_id in doc.frame_elements() {
        let Some(frame_ref) = doc.node_ref(frame_id) else {
            continue;
        };
        let loaded = doc.is_frame_loaded(frame_id);

        if let Some(existing) = frames.iter_mut().find(|frame| frame.frame == frame_ref) {
            if existing.engine.is_enabled() {
                if let Err(err) = existing.engine.scan(0) {
                    tracing::debug!("Skipped rescan of frame {frame_id}: {err}");
                }
            } else {
                existing.pending_scan = true;
                existing.start_if_loaded(loaded);
            }
            continue;
        }

        let child_document = match doc.content_document(frame_id) {
            Ok(child_document) => child_document,
            Err(err) => {
                tracing::debug!("Skipping frame {frame_id}: {err}");
                continue;
            }
        };

        let child_config = config.clone().with_frame_delegation(false);
        match Engine::new(child_document, child_config, shell.clone()) {
            Ok(engine) => {
                let mut delegate = FrameDelegate {
                    frame: frame_ref,
                    engine: engine.with_clock(clock.clone()),
                    pending_scan: true,
                };
                delegate.start_if_loaded(loaded);
                frames.push(delegate);
            }
            Err(err) => tracing::warn!("Could not create engine for frame {frame_id}: {err}"),
        }
    }
}
