//! Portico: content backend for a public institutional website.
//!
//! Every public page module is served from a per-module snapshot that is
//! rebuilt on demand, purged on content writes and, when the origin store is
//! down, replaced by the last snapshot or a static default.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
