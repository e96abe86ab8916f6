//! Time-sliced batch processing
//!
//! A run is a deduplicated queue of nodes drained from the front, one slice per host frame.
//! A slice keeps popping nodes while the time spent is under the budget, so every slice makes
//! progress even when a single node exceeds it.

use std::time::Duration;

use indexmap::IndexSet;
use rtlify_dom::NodeRef;
use rtlify_traits::Clock;

/// What happened to a single node during a slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Processed,
    /// The node left the tree or no longer qualifies
    Skipped,
    Failed,
}

/// Accounting for one slice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Nodes still queued when the slice yielded
    pub remaining: usize,
    pub elapsed: Duration,
}

impl SliceReport {
    pub fn visited(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    pub fn has_more(&self) -> bool {
        self.remaining > 0
    }
}

#[derive(Debug)]
pub struct BatchScheduler {
    queue: IndexSet<NodeRef>,
    cursor: usize,
    budget: Duration,
    running: bool,
}

impl BatchScheduler {
    pub fn new(budget: Duration) -> Self {
        Self {
            queue: IndexSet::new(),
            cursor: 0,
            budget,
            running: false,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Start a run over `nodes`. Ignored while a run is in progress.
    /// Returns whether the run was started.
    pub fn run(&mut self, nodes: impl IntoIterator<Item = NodeRef>) -> bool {
        if self.running {
            return false;
        }
        self.queue = nodes.into_iter().collect();
        self.cursor = 0;
        self.running = !self.queue.is_empty();
        self.running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Nodes not yet visited by the current run
    pub fn len(&self) -> usize {
        self.queue.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the current run
    pub fn abort(&mut self) {
        self.queue.clear();
        self.cursor = 0;
        self.running = false;
    }

    /// Process queued nodes until the budget is spent or the queue is drained.
    ///
    /// The budget is checked after each node and a slice always processes at least one, so a
    /// slice can overrun the budget by the cost of its last node.
    pub fn slice(
        &mut self,
        clock: &dyn Clock,
        mut process: impl FnMut(NodeRef) -> NodeOutcome,
    ) -> SliceReport {
        let mut report = SliceReport::default();
        if !self.running {
            return report;
        }

        let start = clock.now();
        while let Some(node) = self.queue.get_index(self.cursor).copied() {
            self.cursor += 1;
            match process(node) {
                NodeOutcome::Processed => report.processed += 1,
                NodeOutcome::Skipped => report.skipped += 1,
                NodeOutcome::Failed => report.failed += 1,
            }

            report.elapsed = clock.now().saturating_sub(start);
            if report.elapsed >= self.budget {
                break;
            }
        }

        report.remaining = self.len();
        if report.remaining == 0 {
            self.abort();
        }

        tracing::trace!(
            "Slice processed {} skipped {} failed {} in {:?}, {} remaining",
            report.processed,
            report.skipped,
            report.failed,
            report.elapsed,
            report.remaining
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtlify_traits::ManualClock;

    fn refs(count: usize) -> Vec<NodeRef> {
        let mut doc = rtlify_dom::Document::new(rtlify_dom::DocumentConfig::default());
        (0..count)
            .map(|_| {
                let id = doc.append_element(0, "p", &[]).unwrap();
                doc.node_ref(id).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_run_is_single_flight_and_deduplicated() {
        let nodes = refs(3);
        let mut scheduler = BatchScheduler::new(Duration::from_millis(8));

        assert!(scheduler.run(nodes.iter().copied().chain(nodes.iter().copied())));
        assert_eq!(scheduler.len(), 3);
        assert!(!scheduler.run(nodes.iter().copied().take(1)));
        assert_eq!(scheduler.len(), 3);
    }

    #[test]
    fn test_slice_respects_budget_and_always_progresses() {
        let nodes = refs(5);
        let step = Duration::from_millis(5);
        let clock = ManualClock::with_auto_step(step);
        let mut scheduler = BatchScheduler::new(Duration::from_millis(8));
        scheduler.run(nodes);

        // Every node costs more than half the budget: two per slice
        let mut sizes = Vec::new();
        while scheduler.is_running() {
            let report = scheduler.slice(&clock, |_| NodeOutcome::Processed);
            // Overrun is bounded by a single node
            assert!(report.elapsed < scheduler.budget() + step);
            sizes.push(report.processed);
        }
        assert_eq!(sizes, vec![2, 2, 1]);

        // A single node over budget still gets processed
        let mut scheduler = BatchScheduler::new(Duration::from_millis(1));
        scheduler.run(refs(2));
        let report = scheduler.slice(&clock, |_| NodeOutcome::Processed);
        assert_eq!(report.processed, 1);
        assert!(report.has_more());
    }

    #[test]
    fn test_outcomes_are_counted() {
        let nodes = refs(3);
        let clock = ManualClock::new();
        let mut scheduler = BatchScheduler::new(Duration::from_millis(8));
        scheduler.run(nodes.clone());

        let report = scheduler.slice(&clock, |node| {
            if node == nodes[0] {
                NodeOutcome::Skipped
            } else if node == nodes[1] {
                NodeOutcome::Failed
            } else {
                NodeOutcome::Processed
            }
        });
        assert_eq!((report.processed, report.skipped, report.failed), (1, 1, 1));
        assert_eq!(report.visited(), 3);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_abort_drops_the_run() {
        let mut scheduler = BatchScheduler::new(Duration::from_millis(8));
        scheduler.run(refs(4));
        scheduler.abort();
        assert!(!scheduler.is_running());
        assert!(scheduler.is_empty());
        let report = scheduler.slice(&ManualClock::new(), |_| NodeOutcome::Processed);
        assert_eq!(report, SliceReport::default());
    }
}
