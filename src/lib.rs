//! A small HTTP service for short text notes kept in a single JSON file.
//!
//! - [`storage`]: the [`storage::NoteStore`] contract and its file and memory backends.
//! - [`api`]: the axum router exposing CRUD over `/notes`.
//! - [`models`]: the note entity and its input type.
//! - [`config`]: environment-driven server configuration.

pub mod api;
pub mod config;
pub mod models;
pub mod storage;
