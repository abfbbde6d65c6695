//! # studyhall-view
//!
//! Client-side view of the file browser. The server is authoritative for
//! group membership; this crate keeps the last successful fetch as an
//! immutable, generation-tagged snapshot and derives what to render from it.
//! Nothing here is ever used to make an authorization decision.

pub mod browser;
pub mod cache;
pub mod client;
pub mod summary;

mod error;

pub use browser::{FileBrowser, FileCard, GroupCard, RenderedView};
pub use cache::{Applied, FetchTicket, GroupCache, GroupSnapshot};
pub use client::{GroupsClient, RefreshingBrowser};
pub use error::ViewError;
pub use summary::{SummaryClient, SummaryGate};
