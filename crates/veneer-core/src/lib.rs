//! # Veneer core
//!
//! The substrate every widget skin is built from. A skin is the
//! paint/layout/input strategy bound to one component; this crate provides
//! the four pieces that recur across all of them, plus the collaborator
//! seams to the host application:
//!
//! - [`StyleStore`]: per-widget typed style vocabulary with theme-seeded
//!   defaults, string-sheet bridge, and layout-vs-paint change signaling.
//! - [`Measure`]: the three-way preferred-size contract
//!   (width-given-height, height-given-width, unconstrained).
//! - [`HoverPress`] / [`DisplayHub`] / [`start_auto_repeat`]: the pointer
//!   interaction machinery: per-widget press/hover/drag state, display-wide
//!   capture grabs with RAII release, and the two-phase auto-repeat driver.
//! - [`VisibleRows`]: incremental projection of a lazily loaded tree into
//!   the flat row sequence skins actually render, with minimal patches per
//!   edit.
//!
//! Collaborators owned by the host and consumed here: the component tree
//! ([`Component`] handles + [`RepaintScheduler`]), the 2D surface
//! ([`Canvas`] display lists replayed by a [`RenderBackend`]), the timer
//! pump ([`Timers`] with an injectable [`Clock`]), and the theme/resource
//! provider ([`Theme`], [`TextRuler`]).
//!
//! Everything is single-threaded and reactive: skins mutate state in
//! response to input events, model edits, and timer callbacks, and report
//! dirt through the scheduler. Nothing here blocks.

pub mod anim;
pub mod canvas;
pub mod color;
pub mod component;
pub mod display;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod projection;
pub mod style;
pub mod theme;
pub mod timer;

pub use anim::*;
pub use canvas::*;
pub use color::*;
pub use component::*;
pub use display::*;
pub use error::*;
pub use geometry::*;
pub use input::*;
pub use interaction::*;
pub use projection::*;
pub use style::*;
pub use theme::*;
pub use timer::*;
