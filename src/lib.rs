//! # Quotecard
//!
//! Keeps a backlog of ready-to-publish quote cards. Each card is a quote
//! laid out over a generated background, stored with a scheduled date and
//! a review status until someone approves, rejects or publishes it.
//!
//! # Architecture: Three Collaborating Parts
//!
//! ```text
//! QueueScheduler ──needs N──▶ ContentPipeline ──per item──▶ quote → art → layout → store
//!       │                          │
//!    pacing                  Text Layout Engine (imaging)
//! ```
//!
//! 1. The **queue** counts the backlog, decides how many items to make and
//!    from which source, and paces the runs.
//! 2. The **pipeline** turns one source choice into one persisted item: pick
//!    a quote, fetch a background, lay out the card, assign the next free
//!    date, write the item.
//! 3. The **layout engine** wraps text to a character budget, centres the
//!    block on a fixed canvas, and composites it over the background.
//!
//! Quote providers, the art provider and the item store are traits; the
//! crate ships HTTP providers, an offline flat background, an in-memory
//! store and a JSON file store.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`queue`] | Backlog stats, batch fill with source mix, retention cleanup, single generation |
//! | [`pipeline`] | One quote → art → layout → store run and its error taxonomy |
//! | [`imaging`] | Text Layout Engine: wrapping, placement, SVG overlay, image backend |
//! | [`review`] | Reviewer actions with status-transition enforcement |
//! | [`daemon`] | Long-running runner for daily fill, weekly cleanup, periodic stats |
//! | [`calendar`] | Injectable clock and next-free-date assignment |
//! | [`pacing`] | Delay strategies between items in a batch |
//! | [`providers`] | Curated, synthetic and art provider traits and HTTP clients |
//! | [`store`] | `ItemStore` trait, in-memory and JSON file stores |
//! | [`types`] | `ContentItem`, statuses, filters and listing order |
//! | [`config`] | `quotecard.toml` loading, merging over stock defaults, validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Dates Are Assigned, Not Chosen
//!
//! A new item is always scheduled the day after the latest scheduled date
//! (or today for an empty calendar). Rejected and deleted items leave gaps
//! that are not backfilled; `review::Reviewer::reschedule` exists for
//! moving items by hand.
//!
//! ## Character-Budget Wrapping
//!
//! Lines are wrapped at a fixed number of characters rather than measured
//! glyph widths. Layout stays a pure function of the text, which keeps it
//! testable without fonts, at the cost of uneven line widths for wide or
//! narrow typefaces.
//!
//! ## Failures Never Abort a Batch
//!
//! A batch fill counts per-item failures and moves on; only being unable to
//! read the backlog at all stops it. A failed item writes nothing unless
//! `[pipeline] record_failures` asks for a `failed` row.

pub mod calendar;
pub mod config;
pub mod daemon;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod pacing;
pub mod pipeline;
pub mod providers;
pub mod queue;
pub mod review;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
