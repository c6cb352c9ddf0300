//! Shared type definitions for the Tempo web template.
//!
//! This crate holds the types that cross crate boundaries: the push
//! stream's event shape (used by the producer, the wire decoder and the
//! consumer), theme preferences, and the request-derived data the index
//! loader serves to both the HTML page and the terminal consumer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers (connection identifiers)
//! - [`event`] -- [`StreamEvent`] and timestamp formatting
//! - [`theme`] -- [`Theme`], [`ThemePreference`] and optimistic resolution
//! - [`request`] -- Edge request properties, client hints, loader payloads

pub mod event;
pub mod ids;
pub mod request;
pub mod theme;

// Re-export all public types at crate root for convenience.
pub use event::{DEFAULT_EVENT, StreamEvent, TIME_EVENT, iso_timestamp};
pub use ids::ConnectionId;
pub use request::{ClientHints, IndexData, NOT_AVAILABLE, RequestGeo};
pub use theme::{ParseThemeError, Theme, ThemePreference, resolve_theme};
