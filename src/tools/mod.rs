//! Command implementations shared by the CLI.
//!
//! Each command takes a plain input struct and returns a serializable
//! output struct; rendering lives in [`crate::fmt`].

pub mod filters;
mod index;
pub mod pick;
mod search;
mod stats;
pub mod window;

pub use filters::{extension_filter, IMAGE_EXTENSIONS};
pub use index::{execute_index, IndexInput, IndexOutput, DEFAULT_ROOT};
pub use pick::{open_path, pick, OpenAction};
pub use search::{execute_search, execute_search_at, SearchInput, SearchOutput};
pub use stats::{execute_stats, human_bytes, StatsOutput};
