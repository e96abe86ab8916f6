//! The engine: ties discovery, classification, styling and change detection to one document

use std::rc::Rc;
use std::time::Duration;

use rtlify_dom::{Document, DomError, NodeRef, SharedDocument};
use rtlify_traits::{Clock, ShellProvider, SystemClock};

use crate::category::candidate_category;
use crate::classify::{self, qualifies};
use crate::delegate::{self, FrameDelegate};
use crate::error::{EngineError, ProcessError};
use crate::extract::extract;
use crate::schedule::{BatchScheduler, NodeOutcome, SliceReport};
use crate::style::{self, Applied};
use crate::watch::{ChangeWatcher, DebounceState};
use crate::{EngineConfig, Stats, TextCache, select};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Disabled,
    Idle,
    /// Mutations are being collected and debounced
    Scheduling,
    /// A run is being drained slice by slice
    Slicing,
}

/// What the engine needs from the host after a call to [`Engine::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing left to do until the document changes. Documents with a shell provider request
    /// a frame on the next observed mutation; otherwise the host ticks after mutating.
    Idle,
    /// Call again once the clock reaches `deadline`
    Waiting { deadline: Duration },
    /// Work remains; a frame has been requested
    Busy,
}

impl Tick {
    fn merge(self, other: Tick) -> Tick {
        match (self, other) {
            (Tick::Busy, _) | (_, Tick::Busy) => Tick::Busy,
            (Tick::Waiting { deadline: a }, Tick::Waiting { deadline: b }) => Tick::Waiting {
                deadline: a.min(b),
            },
            (waiting @ Tick::Waiting { .. }, Tick::Idle) | (Tick::Idle, waiting) => waiting,
        }
    }
}

pub struct Engine {
    document: SharedDocument,
    config: EngineConfig,
    clock: Rc<dyn Clock>,
    shell: Rc<dyn ShellProvider>,

    enabled: bool,
    destroyed: bool,
    /// The mutation observer could not be registered; only explicit scans pick up changes
    degraded: bool,

    cache: TextCache,
    watcher: ChangeWatcher,
    scheduler: BatchScheduler,
    frames: Vec<FrameDelegate>,
    last_slice: Option<SliceReport>,
}

impl Engine {
    /// Create a disabled engine for `document` and start watching it for mutations
    pub fn new(
        document: SharedDocument,
        config: EngineConfig,
        shell: Rc<dyn ShellProvider>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let mut watcher = ChangeWatcher::new(config.debounce);
        let subscribed = match document.try_borrow_mut() {
            Ok(mut doc) => watcher.subscribe(&mut doc).map_err(EngineError::from),
            Err(_) => Err(EngineError::DocumentBusy),
        };
        let degraded = match subscribed {
            Ok(()) => false,
            Err(err) => {
                tracing::warn!("Could not watch document for changes, running degraded: {err}");
                true
            }
        };

        Ok(Self {
            document,
            scheduler: BatchScheduler::new(config.slice_budget),
            config,
            clock: Rc::new(SystemClock::new()),
            shell,
            enabled: false,
            destroyed: false,
            degraded,
            cache: TextCache::new(),
            watcher,
            frames: Vec::new(),
            last_slice: None,
        })
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.destroyed
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn state(&self) -> EngineState {
        if !self.is_enabled() {
            EngineState::Disabled
        } else if self.scheduler.is_running() {
            EngineState::Slicing
        } else if self.watcher.state() != DebounceState::Idle {
            EngineState::Scheduling
        } else {
            EngineState::Idle
        }
    }

    /// Number of live text cache entries
    pub fn cached_nodes(&self) -> usize {
        self.cache.len()
    }

    /// Number of embedded frames with a child engine
    pub fn delegated_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn last_slice_report(&self) -> Option<SliceReport> {
        self.last_slice
    }

    fn ensure_alive(&self) -> Result<(), EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        Ok(())
    }

    /// Start processing: discover every eligible node in the document and queue it.
    /// Enabling an enabled engine does nothing.
    pub fn enable(&mut self) -> Result<(), EngineError> {
        self.ensure_alive()?;
        if self.enabled {
            return Ok(());
        }

        let document = self.document.clone();
        let mut doc = document
            .try_borrow_mut()
            .map_err(|_| EngineError::DocumentBusy)?;

        // Changes made while disabled are covered by the full scan
        self.watcher.discard(&mut doc);
        self.enabled = true;
        tracing::info!("RTL processing enabled for document {}", doc.id());

        let queued = self.start_scan(&mut doc, 0);
        tracing::debug!("Queued {queued} nodes");
        Ok(())
    }

    /// Stop processing and remove every style the engine applied
    pub fn disable(&mut self) -> Result<(), EngineError> {
        self.ensure_alive()?;

        let document = self.document.clone();
        let mut doc = document
            .try_borrow_mut()
            .map_err(|_| EngineError::DocumentBusy)?;

        self.enabled = false;
        self.watcher.cancel();
        self.scheduler.abort();
        let reverted = style::remove_all(&mut doc);
        self.watcher.discard(&mut doc);
        self.cache.clear();
        self.last_slice = None;
        drop(doc);

        for frame in &mut self.frames {
            frame.suspend();
        }

        tracing::info!("RTL processing disabled, reverted {reverted} elements");
        Ok(())
    }

    /// Discover and queue the eligible nodes of the subtree rooted at `root`.
    ///
    /// Does nothing while disabled or while a run is in progress. Returns the number of nodes queued.
    pub fn scan(&mut self, root: usize) -> Result<usize, EngineError> {
        self.ensure_alive()?;
        if !self.enabled || self.scheduler.is_running() {
            return Ok(0);
        }

        let document = self.document.clone();
        let mut doc = document
            .try_borrow_mut()
            .map_err(|_| EngineError::DocumentBusy)?;
        if doc.get_node(root).is_none() {
            return Err(DomError::UnknownNode(root).into());
        }
        Ok(self.start_scan(&mut doc, root))
    }

    /// Scan the whole document again
    pub fn rescan(&mut self) -> Result<usize, EngineError> {
        self.ensure_alive()?;
        if !self.enabled {
            return Err(EngineError::Disabled);
        }
        self.scan(0)
    }

    fn start_scan(&mut self, doc: &mut Document, root: usize) -> usize {
        self.cache.prune(doc);
        let nodes = select::discover(doc, root, &self.cache);
        let queued = nodes.len();

        if root == 0 && self.config.delegate_frames {
            delegate::sync_frames(doc, &mut self.frames, &self.config, &self.clock, &self.shell);
        }

        if self.scheduler.run(nodes) {
            self.shell.request_frame();
        }
        queued
    }

    /// Disable the engine, stop watching the document and drop every child engine
    pub fn destroy(&mut self) -> Result<(), EngineError> {
        if self.destroyed {
            return Ok(());
        }
        self.disable()?;

        let document = self.document.clone();
        let mut doc = document
            .try_borrow_mut()
            .map_err(|_| EngineError::DocumentBusy)?;
        self.watcher.unsubscribe(&mut doc);
        drop(doc);

        for mut frame in self.frames.drain(..) {
            frame.destroy();
        }
        self.destroyed = true;
        tracing::debug!("Engine destroyed");
        Ok(())
    }

    /// Summary of the elements currently styled in this engine's document
    pub fn stats(&self) -> Result<Stats, EngineError> {
        self.ensure_alive()?;
        let doc = self
            .document
            .try_borrow()
            .map_err(|_| EngineError::DocumentBusy)?;
        Ok(Stats::collect(&doc))
    }

    /// Advance the engine by one cooperative step.
    ///
    /// Drains pending mutation records, advances the debounce timer, runs at most one slice and
    /// drives the engines of embedded frames. Frame elements among the changed nodes get a
    /// delegate engine of their own.
    ///
    /// A document built with a shell provider requests a frame whenever an observed mutation
    /// is recorded. Without one, the host must call `tick` after mutating the document.
    pub fn tick(&mut self) -> Tick {
        if self.destroyed {
            return Tick::Idle;
        }

        let document = self.document.clone();
        let Ok(mut doc) = document.try_borrow_mut() else {
            tracing::debug!("Document busy, retrying next frame");
            self.shell.request_frame();
            return Tick::Busy;
        };

        if !self.enabled {
            self.watcher.discard(&mut doc);
            return Tick::Idle;
        }

        if self.scheduler.is_running() {
            let dropped = self.watcher.discard(&mut doc);
            if dropped > 0 {
                tracing::debug!("Dropped {dropped} mutation records observed mid-slice");
            }
        } else {
            let now = self.clock.now();
            self.watcher.collect(&mut doc, &mut self.cache, now);
            if let Some(affected) = self.watcher.poll(now) {
                let frame_added = affected.iter().any(|node| {
                    doc.resolve(*node)
                        .and_then(|node| node.element_data())
                        .is_some_and(|el| el.frame.is_some())
                });
                if frame_added && self.config.delegate_frames {
                    delegate::sync_frames(
                        &doc,
                        &mut self.frames,
                        &self.config,
                        &self.clock,
                        &self.shell,
                    );
                }
                let nodes = select::filter(&doc, affected, &self.cache);
                tracing::debug!("Reprocessing {} changed nodes", nodes.len());
                self.scheduler.run(nodes);
                self.watcher.flushed();
            }
        }

        if self.scheduler.is_running() {
            let threshold = self.config.rtl_threshold;
            let visual_feedback = self.config.visual_feedback;
            let cache = &mut self.cache;
            let report = self.scheduler.slice(self.clock.as_ref(), |node| {
                match process_node(&mut doc, cache, node, threshold, visual_feedback) {
                    Ok(outcome) => outcome,
                    Err(ProcessError::Detached) => NodeOutcome::Skipped,
                    Err(err) => {
                        tracing::warn!("Failed to process node {}: {err}", node.id());
                        NodeOutcome::Failed
                    }
                }
            });
            self.last_slice = Some(report);
        }

        let loaded: Vec<bool> = self
            .frames
            .iter()
            .map(|frame| frame.is_loaded(&doc))
            .collect();
        drop(doc);

        let mut tick = if self.scheduler.is_running() {
            self.shell.request_frame();
            Tick::Busy
        } else if let Some(deadline) = self.watcher.deadline() {
            Tick::Waiting { deadline }
        } else {
            Tick::Idle
        };

        for (frame, loaded) in self.frames.iter_mut().zip(loaded) {
            tick = tick.merge(frame.drive(loaded));
        }
        tick
    }
}

/// Classify one node and style or revert it
fn process_node(
    doc: &mut Document,
    cache: &mut TextCache,
    node: NodeRef,
    threshold: f32,
    visual_feedback: bool,
) -> Result<NodeOutcome, ProcessError> {
    let node_id = doc
        .resolve(node)
        .filter(|n| n.is_in_document())
        .map(|n| n.id)
        .ok_or(ProcessError::Detached)?;

    let Some(category) = candidate_category(doc, node_id) else {
        if style::is_styled(doc, node_id) {
            style::revert(doc, node_id)?;
        }
        cache.invalidate(node);
        return Ok(NodeOutcome::Skipped);
    };

    let text = extract(doc, node, cache).ok_or(ProcessError::Detached)?;

    // Left unprocessed so that removing the override makes the node eligible again
    if style::has_ltr_override(doc, node_id) {
        if style::is_styled(doc, node_id) {
            style::revert(doc, node_id)?;
        }
        return Ok(NodeOutcome::Skipped);
    }

    let ratio = classify::ratio(&text);
    if qualifies(category, ratio, threshold) {
        let applied = style::apply(doc, node_id, category, ratio, visual_feedback)?;
        if applied == Applied::Styled {
            tracing::trace!("Styled {category} node {node_id} with ratio {ratio:.2}");
        }
    } else if style::is_styled(doc, node_id) {
        style::revert(doc, node_id)?;
    }

    cache.mark_processed(node);
    Ok(NodeOutcome::Processed)
}
