//! Pipeline stages for turning a PDF into learning material.
//!
//! Each submodule owns one transformation step so it can be tested alone
//! and swapped (a different PDF backend, a different model host) without
//! touching its neighbours.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ clean ──▶ llm ──▶ normalize ──▶ layout
//! (pdfium)   (regex)   (HTTP)  (decode or     (concept graph
//!                               fallback)      only)
//! ```
//!
//! 1. [`extract`]   : validate the file, read page text and metadata; runs in
//!    `spawn_blocking` because pdfium is synchronous
//! 2. [`clean`]     : strip extraction artifacts from the raw text
//! 3. [`llm`]       : one completion call per artifact; the only stage with
//!    network I/O
//! 4. [`normalize`] : decode replies into strict shapes, falling back to
//!    deterministic placeholders when the model did not answer in JSON
//! 5. [`layout`]    : place concept nodes in 3D

pub mod clean;
pub mod extract;
pub mod layout;
pub mod llm;
pub mod normalize;
