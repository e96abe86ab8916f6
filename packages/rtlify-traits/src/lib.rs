//! Shared traits and types for rtlify hosts
//!
//! The engine in the `rtlify` crate never talks to a real event loop, timer or storage backend
//! directly. Instead the embedder supplies implementations of the traits in this crate:
//!
//!  - [`Clock`] provides monotonic time for debouncing and slice budgets.
//!  - [`ShellProvider`] is asked for another frame whenever the engine has work left.
//!  - [`SettingsStore`] is the persistent, shared key/value storage holding the enabled flag.
//!
//! Dummy and in-memory implementations are provided for headless use and for tests.

pub mod shell;
pub mod storage;
pub mod time;

pub use shell::{CountingShellProvider, DummyShellProvider, ShellProvider};
pub use storage::{MemorySettingsStore, SettingChange, SettingsStore};
pub use time::{Clock, ManualClock, SystemClock};
