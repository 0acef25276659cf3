//! Investments loader
//!
//! Fetches investment listings for one category at a time, retries transient
//! failures on a fixed budget, and renders the result as card markup. Only the
//! most recently selected category may ever reach the rendered output.

pub mod client;
pub mod constants;
pub mod error;
pub mod format;
pub mod loader;
pub mod machine;
pub mod render;
pub mod settings;
pub mod types;

pub use client::{HttpSource, InvestmentSource};
pub use error::{ConfigError, FetchError};
pub use loader::CategoryContentLoader;
pub use machine::{Command, Event, LoadMachine, RetryPolicy};
pub use render::{render, Card, RenderOptions, View, ViewKind};
pub use settings::{Settings, Translations};
pub use types::{CategorySelector, CategoryTag, Investment, InvestmentsResponse, LoadState};
