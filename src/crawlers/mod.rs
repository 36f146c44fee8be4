pub mod crawler;
pub mod frontier;
pub mod subpages;
pub mod web;

#[cfg(test)]
pub(crate) mod fake;

pub use crawler::{FetchedPage, PageSource, Session};
pub use web::{BrowserSession, SessionConfig};
