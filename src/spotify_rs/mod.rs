//! Thin bindings for the parts of the Spotify Web API used by the sync.
//!
//! Docs: https://developer.spotify.com/documentation/web-api

pub mod auth;
pub mod client;
pub mod types;
