//! Messaging client core for the TradeHub marketplace: REST client, query
//! cache, contact directory, selection and composer. The GTK shell lives in
//! the `tradehub-gtk` binary.

pub mod api;
pub mod cache;
pub mod composer;
pub mod config;
pub mod directory;
pub mod error;
pub mod page;
pub mod selection;
pub mod session;
pub mod storage;
pub mod thread;

pub use error::{Error, Result};
