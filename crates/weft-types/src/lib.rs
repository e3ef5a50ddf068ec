//! Core types for weft.
//!
//! This crate provides foundational identifier types and the error-code
//! convention shared by every weft crate.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Layer                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  weft-types  : ID types, ErrorCode              ◄── HERE     │
//! │  weft-event  : LogRecord, RenderEvent                        │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Engine Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  weft-render : Node, RenderContext, LiveElement, memo, fork  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use weft_types::{ElementId, RenderId};
//!
//! let render = RenderId::new();
//! let element = ElementId::new();
//! assert_ne!(render.uuid(), element.uuid());
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ElementId, ForkId, LiveId, RenderId};
