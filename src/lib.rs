//! Adaptive content polling with DOM reconciliation.
//!
//! Components marked `data-notify-module="update-content"` poll a JSON resource and morph the markup it returns into
//! the live page, backing off when the server is slow and leaving unchanged nodes alone.
//!
//! Everything except [`browser`], [`morph`] and [`update_content`] is platform-agnostic and talks to the page only
//! through the [`poller::Environment`], [`poller::FormSource`], [`render::Dom`] and [`render::Reconcile`] traits.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backoff;
pub mod browser;
pub mod config;
pub mod error;
pub mod modules;
pub mod morph;
pub mod payload;
pub mod poller;
pub mod queue;
pub mod render;
pub mod resources;
pub mod update_content;
