//! Incremental right-to-left script detection and styling for live documents
//!
//! An [`Engine`] watches an [`rtlify_dom::Document`], classifies the text of eligible elements
//! by the share of right-to-left script they contain, and styles the elements dominated by it
//! with right alignment and a right-to-left flow. Work is debounced after mutations and drained
//! in time slices so the host's frame loop never stalls for longer than one slice budget.
//!
//! Hosts drive the engine by calling [`Engine::tick`] whenever their
//! [`ShellProvider`](rtlify_traits::ShellProvider) is asked for a frame. Commands from other
//! contexts arrive through the [`protocol`] module and the persisted enabled flag is reconciled
//! through [`settings::SettingsBridge`].

pub mod cache;
pub mod category;
pub mod classify;
mod config;
mod delegate;
mod engine;
mod error;
pub mod extract;
pub mod protocol;
pub mod schedule;
pub mod select;
pub mod settings;
mod stats;
pub mod style;
pub mod watch;

pub use cache::TextCache;
pub use category::TagCategory;
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineState, Tick};
pub use error::{EngineError, ProcessError};
pub use schedule::SliceReport;
pub use stats::Stats;
