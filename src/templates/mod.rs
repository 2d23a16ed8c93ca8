//! Per-block record templates
//!
//! A template is a struct-of-arrays buffer for one block of the output
//! schema: one `Vec` per column, one push per object. Templates are cleared
//! at the start of each event, filled by the assembler passes, verified for
//! column alignment, and finally rendered into the event's `EventRow`.
//!
//! Alignment is the core invariant: every column of a template must hold
//! exactly one entry per filled object. The fill methods are written so that
//! each object push touches every column once; `check_aligned` turns any
//! slip into a fatal error before the row is committed.

use crate::error::{NtupleError, NtupleResult};
use crate::store::{ColumnSpec, EventRow};

mod hit;
mod muon;
mod seed;
mod track;
mod truth;
mod vertex;

pub use hit::HitTemplate;
pub use muon::MuonTemplate;
pub use seed::SeedTemplate;
pub use track::TrackTemplate;
pub use truth::{MatchedTrackSummary, TruthTemplate};
pub use vertex::VertexTemplate;

/// Common surface of every record template
pub trait RecordTemplate {
    /// Drop all rows, keeping the column structure
    fn clear(&mut self);

    /// Number of filled objects, taken from the leading column
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify that every column holds exactly `len()` entries
    fn check_aligned(&self) -> NtupleResult<()>;

    /// Column declarations, in render order
    fn schema(&self) -> Vec<ColumnSpec>;

    /// Render all columns into the event row
    fn write_into(&self, row: &mut EventRow);
}

/// Alignment check over (column name, length) pairs against the row count
pub(crate) fn check_columns(
    template: &str,
    expected: usize,
    columns: &[(&str, usize)],
) -> NtupleResult<()> {
    for &(name, got) in columns {
        if got != expected {
            return Err(NtupleError::ColumnMisaligned {
                template: template.to_string(),
                column: name.to_string(),
                expected,
                got,
            });
        }
    }
    Ok(())
}
