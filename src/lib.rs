//! Columnar flattening of muon-trigger reconstruction output
//!
//! Takes fully reconstructed collision events (tracks, seeds, muon
//! candidates, trigger candidates, simulation truth) and renders each one
//! as a single flat row of named columns, one array entry per object.
//! Objects produced by different steps of the tracking chain carry no
//! shared identifiers; they are joined within an event through the
//! bit-exact fingerprint of the seed starting state both steps copied.
//!
//! ```text
//!                    +--------------------------+
//!   Event ---------> |      EventAssembler      | ----> EventRow ----> sink
//!   (per collision)  |                          |       (validated)
//!                    |  candidate maps  <-+     |
//!                    |  stage maps  <---+ |     |
//!                    |                  | |     |
//!                    |  muons ----------+-+     |
//!                    |  tracks ---------+  \    |
//!                    |  seeds  ------------/    |
//!                    |  truth  x association    |
//!                    |  seeds  x classifiers    |
//!                    +--------------------------+
//! ```
//!
//! Seven tracking stages are flattened independently; the `Iter2` stages
//! additionally score every seed through a barrel/endcap classifier pair.

pub mod assembler;
pub mod association;
pub mod config;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod geometry;
pub mod scoring;
pub mod stage;
pub mod store;
pub mod synthetic;
pub mod templates;

pub use assembler::EventAssembler;
pub use association::{HitOverlapAssociator, TruthAssociation};
pub use error::{NtupleError, NtupleResult};
pub use event::Event;
pub use fingerprint::SeedFingerprint;
pub use stage::Stage;
pub use store::{ColumnarStore, JsonLinesWriter, MemoryStore};

/// Commonly used types in one import
pub mod prelude {
    pub use crate::assembler::EventAssembler;
    pub use crate::association::{RecoMatch, TruthAssociation, TruthMatch};
    pub use crate::config::{JobConfig, ScorerSet};
    pub use crate::error::{NtupleError, NtupleResult};
    pub use crate::event::{Event, EventId, Seed, StageProducts, Track, TrajectoryState};
    pub use crate::fingerprint::SeedFingerprint;
    pub use crate::geometry::{SurfaceAtlas, SurfaceGeometry};
    pub use crate::stage::{IdentityMap, Stage, StageMap};
    pub use crate::store::{ColumnarStore, EventRow, JsonLinesWriter, MemoryStore};
    pub use crate::synthetic::SyntheticEventSource;
}

#[cfg(test)]
mod tests;
