//! Computes a safe, ordered DDL migration plan between two PostgreSQL schemas.
//!
//! The core is a pure function, [`diff`]: given an old and a new [`model::Schema`], it
//! returns a totally ordered [`RenderedStatement`] plan with migration hazards attached. No
//! I/O happens here — [`ingest`] is the one place that talks to a live catalog, and it's a
//! seam the rest of the crate only depends on through the [`ingest::CatalogIngestor`] trait.

pub mod diff;
pub mod error;
pub mod hazard;
pub mod ingest;
pub mod model;
pub mod ops;
pub mod planner;
pub mod render;
pub mod rewrite;

pub use error::{DriftError, DriftResult};
pub use hazard::Hazard;
pub use model::Schema;
pub use render::{RenderHints, RenderedStatement};

use tracing::{info, instrument};

/// Diffs `old` against `new` and renders a complete, ordered migration plan.
///
/// Deterministic and side-effect free: the same `(old, new, hints)` always produces the
/// same plan, byte for byte.
#[instrument(skip_all)]
pub fn diff(old: &Schema, new: &Schema, hints: &RenderHints) -> DriftResult<Vec<RenderedStatement>> {
    let ops = diff::diff_schema(old, new);
    info!(op_count = ops.len(), "computed raw diff");

    let planned = planner::plan(ops)?;
    let rendered = render::render_plan(&planned, hints)?;

    info!(statement_count = rendered.len(), "rendered migration plan");
    Ok(rendered)
}
