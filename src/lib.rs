//! Guided-tour progression engine for an interactive 3D museum map.
//!
//! Visitors move through a fixed sequence of points of interest. Only the
//! current frontier and points already visited accept clicks; confirming a
//! visit at the frontier unlocks the next point. Progress survives page
//! reloads through a small key/value store.
//!
//! The crate is renderer-agnostic. [`engine::EngineCore`] owns all rules and
//! returns [`engine::Action`]s for the host to apply to its scene, overlay,
//! and audio layers. With the `web` feature the crate also builds to
//! WebAssembly and exposes a browser wrapper backed by `localStorage`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Focus/return state machine and the [`engine::Action`] protocol |
//! | [`session`] | Engine wired to a store and narration; what hosts drive |
//! | [`tour`] | Points of interest, activation states, and the frontier |
//! | [`path`] | Camera flight plans along Catmull-Rom curves |
//! | [`camera`] | Vector math and camera poses |
//! | [`store`] | Persisted progress and audio preference |
//! | [`config`] | JSON tour definitions |
//! | [`content`] | Artwork catalog shown in the overlay |
//! | [`narration`] | Captions, audio preference, and narration commands |
//! | [`proximity`] | NFC text-record tags that confirm a visit |
//! | [`consts`] | Timing constants and storage keys |
//! | [`error`] | Crate error type |
//! | `web` | Browser wrapper (`web` feature) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod content;
pub mod engine;
pub mod error;
pub mod narration;
pub mod path;
pub mod proximity;
pub mod session;
pub mod store;
pub mod tour;

#[cfg(feature = "web")]
pub mod web;
