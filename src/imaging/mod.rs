//! Quote card layout and rendering.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Wrap** | [`wrap_text`], fixed character budget per line |
//! | **Place** | [`place_block`], vertically centred block with top bias |
//! | **Markup** | [`overlay_svg`], every string passed through [`escape_markup`] |
//! | **Composite** | [`RustBackend`]: `image` resize/crop + `resvg` overlay + JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for wrap and placement math (unit testable)
//! - **Parameters**: Data structures describing the card and compose step
//! - **Markup**: Escaping and SVG overlay generation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`plan_card`] and [`QuoteCardRenderer`]

pub mod backend;
mod calculations;
mod markup;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{
    BlockMetrics, BlockPlacement, calculate_fill_dimensions, place_block, wrap_text,
};
pub use markup::{escape_markup, overlay_svg};
pub use operations::{CardPlan, QuoteCardRenderer, plan_card};
pub use params::{ComposeParams, FontSpec, LayoutParams, Quality};
pub use rust_backend::RustBackend;
