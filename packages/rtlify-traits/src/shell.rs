//! Frame pacing between the engine and its host

use std::cell::Cell;

/// A type that the host implements to receive scheduling requests from the engine.
///
/// The host is expected to call back into the engine (`Engine::tick`) on its next scheduling
/// opportunity, e.g. the next animation frame of a UI event loop.
pub trait ShellProvider {
    /// Ask the host for another frame.
    fn request_frame(&self) {}
}

/// A shell provider that ignores every request. Hosts using it must tick the engine on their own.
pub struct DummyShellProvider;
impl ShellProvider for DummyShellProvider {}

/// A shell provider that counts frame requests.
#[derive(Debug, Default)]
pub struct CountingShellProvider {
    requested: Cell<usize>,
}

impl CountingShellProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames requested so far
    pub fn requested(&self) -> usize {
        self.requested.get()
    }
}

impl ShellProvider for CountingShellProvider {
    fn request_frame(&self) {
        self.requested.set(self.requested.get() + 1);
    }
}
