//! Per-event assembly driver
//!
//! One `EventAssembler` owns every record template plus the per-event
//! identity maps, and turns each `Event` into one validated output row.
//! Pass order within an event matters, because later passes consume the
//! identity maps and template rows the earlier passes produced:
//!
//! ```text
//! clear -> header -> vertices -> hits -> muon candidates (build candidate
//! maps) -> per-stage tracks (consume candidate maps, build stage maps,
//! truth match, score) -> per-stage truth -> inclusive truth muons ->
//! per-stage seeds (consume stage maps, relations, score) -> commit
//! ```
//!
//! Missing event collections are skipped, leaving their blocks empty or,
//! for per-object columns, filled with sentinels. A template whose columns
//! come out ragged aborts the job: that is a fill-logic bug, not a data
//! condition.

use crate::config::ScorerSet;
use crate::error::NtupleResult;
use crate::event::{BeamSpot, Event, Track, TrajectoryState, NO_LINK, SENTINEL_F, SENTINEL_I};
use crate::fingerprint::SeedFingerprint;
use crate::geometry::{GlobalPoint, GlobalVector, LocalPoint, LocalVector, SurfaceGeometry};
use crate::scoring::{compute_relations, SeedRelations, SeedScorerPair};
use crate::stage::{IdentityMap, Stage, StageMap};
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, ColumnarStore, EventRow};
use crate::templates::{
    HitTemplate, MatchedTrackSummary, MuonTemplate, RecordTemplate, SeedTemplate, TrackTemplate,
    TruthTemplate, VertexTemplate,
};
use log::{debug, error, warn};
use std::sync::Arc;

/// Classifier outputs are shifted into a positive range before storage
const SCORE_SHIFT: f64 = 0.5;

pub struct EventAssembler {
    geometry: Arc<dyn SurfaceGeometry>,
    scorers: ScorerSet,

    offline_vertices: VertexTemplate,
    candidate_vertices: VertexTemplate,
    from_l1_vertices: VertexTemplate,
    hits: HitTemplate,
    muons: MuonTemplate,
    muons_no_id: MuonTemplate,
    tracks: StageMap<TrackTemplate>,
    truths: StageMap<TruthTemplate>,
    truth_muons: TruthTemplate,
    seeds: StageMap<SeedTemplate>,

    candidate_map: IdentityMap,
    candidate_no_id_map: IdentityMap,
    stage_maps: StageMap<IdentityMap>,
}

impl EventAssembler {
    pub fn new(geometry: Arc<dyn SurfaceGeometry>, scorers: ScorerSet) -> Self {
        Self {
            geometry,
            scorers,
            offline_vertices: VertexTemplate::new("PV"),
            candidate_vertices: VertexTemplate::new("pixelVertex"),
            from_l1_vertices: VertexTemplate::new("pixelVertexFromL1"),
            hits: HitTemplate::new("recHit"),
            muons: MuonTemplate::new("muon"),
            muons_no_id: MuonTemplate::new("muonNoId"),
            tracks: StageMap::from_fn(|s| TrackTemplate::new(s.track_prefix())),
            truths: StageMap::from_fn(|s| TruthTemplate::new(s.truth_prefix())),
            truth_muons: TruthTemplate::new("TP"),
            seeds: StageMap::from_fn(|s| SeedTemplate::new(s.seed_prefix())),
            candidate_map: IdentityMap::new(),
            candidate_no_id_map: IdentityMap::new(),
            stage_maps: StageMap::default(),
        }
    }

    /// Header columns: event numbers, data flag, pileup, beam spot, and the
    /// L1/L2 trigger-candidate blocks
    fn header_schema() -> Vec<ColumnSpec> {
        let mut out = vec![
            ColumnSpec::new("runNum", ColumnKind::UInt),
            ColumnSpec::new("lumiBlockNum", ColumnKind::UInt),
            ColumnSpec::new("eventNum", ColumnKind::UInt),
            ColumnSpec::new("isRealData", ColumnKind::Int),
            ColumnSpec::new("truePU", ColumnKind::Float),
            ColumnSpec::new("nGoodVertex", ColumnKind::Int),
        ];
        for field in [
            "bs_x0",
            "bs_y0",
            "bs_z0",
            "bs_sigmaZ",
            "bs_dxdz",
            "bs_dydz",
            "bs_x0Err",
            "bs_y0Err",
            "bs_z0Err",
            "bs_sigmaZErr",
            "bs_dxdzErr",
            "bs_dydzErr",
        ] {
            out.push(ColumnSpec::new(field, ColumnKind::Float));
        }
        out.push(ColumnSpec::new("nL1Muon", ColumnKind::Int));
        out.push(ColumnSpec::new("L1Muon_pt", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L1Muon_eta", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L1Muon_phi", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L1Muon_etaAtVtx", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L1Muon_phiAtVtx", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L1Muon_charge", ColumnKind::IntArray));
        out.push(ColumnSpec::new("L1Muon_quality", ColumnKind::IntArray));
        out.push(ColumnSpec::new("L1Muon_bx", ColumnKind::IntArray));
        out.push(ColumnSpec::new("nL2Muon", ColumnKind::Int));
        out.push(ColumnSpec::new("L2Muon_pt", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L2Muon_eta", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L2Muon_phi", ColumnKind::FloatArray));
        out.push(ColumnSpec::new("L2Muon_charge", ColumnKind::IntArray));
        out
    }

    /// Full output schema, header block first then every template block
    pub fn schema(&self) -> Vec<ColumnSpec> {
        let mut out = Self::header_schema();
        out.extend(self.offline_vertices.schema());
        out.extend(self.candidate_vertices.schema());
        out.extend(self.from_l1_vertices.schema());
        out.extend(self.hits.schema());
        out.extend(self.muons.schema());
        out.extend(self.muons_no_id.schema());
        for (_, tpl) in self.tracks.iter() {
            out.extend(tpl.schema());
        }
        for (_, tpl) in self.truths.iter() {
            out.extend(tpl.schema());
        }
        out.extend(self.truth_muons.schema());
        for (_, tpl) in self.seeds.iter() {
            out.extend(tpl.schema());
        }
        out
    }

    /// Declare the schema on a sink; must run once before the first event
    pub fn register_schema<S: ColumnarStore>(&self, store: &mut S) -> NtupleResult<()> {
        store.register_schema(self.schema())
    }

    /// Flatten one event into the sink
    pub fn process<S: ColumnarStore>(&mut self, event: &Event, store: &mut S) -> NtupleResult<()> {
        self.clear();

        self.fill_vertices(event);
        self.fill_hits(event);
        self.fill_candidates(event);
        self.fill_tracks(event);
        self.fill_truth(event);
        self.fill_seeds(event);

        if let Err(err) = self.check_aligned() {
            error!(
                "event {}:{}:{}: {err}",
                event.id.run, event.id.lumi_block, event.id.event
            );
            return Err(err);
        }

        let mut row = EventRow::new();
        self.write_header(event, &mut row);
        self.write_blocks(&mut row);

        debug!(
            "event {}:{}:{} flattened, {} muons, {} truth muons",
            event.id.run,
            event.id.lumi_block,
            event.id.event,
            self.muons.len(),
            self.truth_muons.len(),
        );
        store.commit(row)
    }

    fn clear(&mut self) {
        self.offline_vertices.clear();
        self.candidate_vertices.clear();
        self.from_l1_vertices.clear();
        self.hits.clear();
        self.muons.clear();
        self.muons_no_id.clear();
        for (_, tpl) in self.tracks.iter_mut() {
            tpl.clear();
        }
        for (_, tpl) in self.truths.iter_mut() {
            tpl.clear();
        }
        self.truth_muons.clear();
        for (_, tpl) in self.seeds.iter_mut() {
            tpl.clear();
        }
        self.candidate_map.clear();
        self.candidate_no_id_map.clear();
        for (_, map) in self.stage_maps.iter_mut() {
            map.clear();
        }
    }

    fn fill_vertices(&mut self, event: &Event) {
        if let Some(vs) = &event.offline_vertices {
            for v in vs {
                self.offline_vertices.fill(v);
            }
        }
        if let Some(vs) = &event.candidate_vertices {
            for v in vs {
                self.candidate_vertices.fill(v);
            }
        }
        if let Some(vs) = &event.from_l1_vertices {
            for v in vs {
                self.from_l1_vertices.fill(v);
            }
        }
    }

    fn fill_hits(&mut self, event: &Event) {
        if let Some(hits) = &event.hits {
            for hit in hits {
                self.hits.fill(hit, self.geometry.as_ref());
            }
        }
    }

    /// Fill both candidate blocks and build the candidate identity maps
    /// from the inner-track seed states
    fn fill_candidates(&mut self, event: &Event) {
        let bs = event.beam_spot.as_ref();
        if let Some(muons) = &event.muons {
            for muon in muons {
                let row = self.muons.fill(muon, bs);
                if let Some(state) = muon.inner.as_ref().and_then(|t| t.seed_state.as_ref()) {
                    self.candidate_map
                        .insert(SeedFingerprint::from_state(state), row);
                }
            }
        }
        if let Some(muons) = &event.muons_no_id {
            for muon in muons {
                let row = self.muons_no_id.fill(muon, bs);
                if let Some(state) = muon.inner.as_ref().and_then(|t| t.seed_state.as_ref()) {
                    self.candidate_no_id_map
                        .insert(SeedFingerprint::from_state(state), row);
                }
            }
        }
    }

    fn fill_tracks(&mut self, event: &Event) {
        let bs = event.beam_spot.as_ref();
        let truth_particles = event.truth_particles.as_deref();
        for stage in Stage::all() {
            let Some(products) = event.stage(stage) else {
                continue;
            };
            let Some(tracks) = &products.tracks else {
                continue;
            };
            let association = products.track_association.as_ref();
            let scorer = if scoring_context_available(event, stage) {
                self.scorers.for_stage(stage)
            } else {
                None
            };
            let tpl = self.tracks.get_mut(stage);
            let stage_map = self.stage_maps.get_mut(stage);
            for (i, trk) in tracks.iter().enumerate() {
                let row = tpl.fill(trk, bs);

                match association.and_then(|a| a.best_match(i)) {
                    Some(m) => match truth_particles.and_then(|tps| tps.get(m.truth_index)) {
                        Some(tp) => tpl.fill_best_truth(tp, m.shared_fraction, m.ambiguity),
                        None => {
                            warn!(
                                "{}: track {} matched to missing truth index {}",
                                stage.name(),
                                i,
                                m.truth_index
                            );
                            tpl.fill_dummy_truth();
                        }
                    },
                    None => tpl.fill_dummy_truth(),
                }

                match &trk.seed_state {
                    Some(state) => {
                        let fp = SeedFingerprint::from_state(state);
                        stage_map.insert(fp, row);
                        tpl.link_candidates(
                            self.candidate_map.link(&fp),
                            self.candidate_no_id_map.link(&fp),
                        );
                    }
                    None => tpl.link_candidates(NO_LINK, NO_LINK),
                }

                match (&trk.seed_state, scorer) {
                    (Some(state), Some(scorer)) => {
                        let (p, x) = global_state(self.geometry.as_ref(), state);
                        let rel = seed_relations(event, p, x);
                        tpl.fill_score(scorer.score(p.perp(), p.eta(), &rel) + SCORE_SHIFT);
                    }
                    _ => tpl.fill_no_score(),
                }
            }
        }
    }

    fn fill_truth(&mut self, event: &Event) {
        let Some(truth_particles) = event.truth_particles.as_deref() else {
            return;
        };

        // per-stage blocks: in-time stable truth muons, with their best
        // reconstructed track of that stage
        let bs = event.beam_spot.as_ref();
        for stage in Stage::all() {
            let Some(products) = event.stage(stage) else {
                continue;
            };
            let Some(tracks) = products.tracks.as_deref() else {
                continue;
            };
            let association = products.track_association.as_ref();
            let scorer = if scoring_context_available(event, stage) {
                self.scorers.for_stage(stage)
            } else {
                None
            };
            let tpl = self.truths.get_mut(stage);
            for (ti, tp) in truth_particles.iter().enumerate() {
                if !(tp.is_in_time() && tp.is_muon() && tp.is_stable()) {
                    continue;
                }
                tpl.fill(tp);
                match association
                    .and_then(|a| a.best_reco_for(ti))
                    .and_then(|rm| tracks.get(rm.reco_index).map(|t| (t, rm.quality)))
                {
                    Some((trk, quality)) => {
                        let summary = matched_summary(
                            self.geometry.as_ref(),
                            scorer,
                            event,
                            trk,
                            quality,
                            bs,
                        );
                        tpl.fill_matched_track(&summary);
                    }
                    None => tpl.fill_dummy_matched(),
                }
            }
        }

        // inclusive block: every truth muon, no association
        for tp in truth_particles.iter().filter(|tp| tp.is_muon()) {
            self.truth_muons.fill(tp);
            self.truth_muons.fill_dummy_matched();
        }
    }

    fn fill_seeds(&mut self, event: &Event) {
        let truth_particles = event.truth_particles.as_deref();
        for stage in Stage::all() {
            let Some(products) = event.stage(stage) else {
                continue;
            };
            let Some(seeds) = products.seeds.as_deref() else {
                continue;
            };
            let association = products.seed_association.as_ref();
            let scorer = if scoring_context_available(event, stage) {
                self.scorers.for_stage(stage)
            } else {
                None
            };
            let tpl = self.seeds.get_mut(stage);
            let track_tpl = self.tracks.get(stage);
            let stage_map = self.stage_maps.get(stage);
            for (i, seed) in seeds.iter().enumerate() {
                let state = &seed.starting_state;
                let (p, x) = global_state(self.geometry.as_ref(), state);
                let (pt, eta, phi) = (p.perp(), p.eta(), p.phi());
                tpl.fill(state, pt, eta, phi);

                let rel = seed_relations(event, p, x);
                tpl.fill_relations(&rel);

                match association.and_then(|a| a.best_match(i)) {
                    Some(m) => match truth_particles.and_then(|tps| tps.get(m.truth_index)) {
                        Some(tp) => tpl.fill_best_truth(tp, m.shared_fraction, m.ambiguity),
                        None => {
                            warn!(
                                "{}: seed {} matched to missing truth index {}",
                                stage.name(),
                                i,
                                m.truth_index
                            );
                            tpl.fill_dummy_truth();
                        }
                    },
                    None => tpl.fill_dummy_truth(),
                }

                let link = stage_map.link(&SeedFingerprint::from_state(state));
                if link >= 0 {
                    let row = link as usize;
                    tpl.link_track(
                        link,
                        track_tpl.row_kinematics(row),
                        track_tpl.best_truth_summary(row),
                    );
                } else {
                    tpl.link_track(NO_LINK, None, None);
                }

                match scorer {
                    Some(scorer) => tpl.fill_score(scorer.score(pt, eta, &rel) + SCORE_SHIFT),
                    None => tpl.fill_no_score(),
                }
            }
        }
    }

    fn check_aligned(&self) -> NtupleResult<()> {
        self.offline_vertices.check_aligned()?;
        self.candidate_vertices.check_aligned()?;
        self.from_l1_vertices.check_aligned()?;
        self.hits.check_aligned()?;
        self.muons.check_aligned()?;
        self.muons_no_id.check_aligned()?;
        for (_, tpl) in self.tracks.iter() {
            tpl.check_aligned()?;
        }
        for (_, tpl) in self.truths.iter() {
            tpl.check_aligned()?;
        }
        self.truth_muons.check_aligned()?;
        for (_, tpl) in self.seeds.iter() {
            tpl.check_aligned()?;
        }
        Ok(())
    }

    fn write_header(&self, event: &Event, row: &mut EventRow) {
        row.set("runNum", ColumnValue::UInt(event.id.run as u64));
        row.set("lumiBlockNum", ColumnValue::UInt(event.id.lumi_block as u64));
        row.set("eventNum", ColumnValue::UInt(event.id.event));
        row.set("isRealData", ColumnValue::Int(event.is_real_data as i64));
        row.set(
            "truePU",
            ColumnValue::Float(event.true_pileup().unwrap_or(SENTINEL_F)),
        );
        row.set(
            "nGoodVertex",
            ColumnValue::Int(event.n_good_vertices().map_or(SENTINEL_I, |n| n as i64)),
        );
        write_beam_spot(row, event.beam_spot.as_ref());

        let l1 = event.l1_candidates.as_deref().unwrap_or(&[]);
        row.set(
            "nL1Muon",
            ColumnValue::Int(if event.l1_candidates.is_some() {
                l1.len() as i64
            } else {
                SENTINEL_I
            }),
        );
        row.set(
            "L1Muon_pt",
            ColumnValue::FloatArray(l1.iter().map(|c| c.pt).collect()),
        );
        row.set(
            "L1Muon_eta",
            ColumnValue::FloatArray(l1.iter().map(|c| c.eta).collect()),
        );
        row.set(
            "L1Muon_phi",
            ColumnValue::FloatArray(l1.iter().map(|c| c.phi).collect()),
        );
        row.set(
            "L1Muon_etaAtVtx",
            ColumnValue::FloatArray(l1.iter().map(|c| c.eta_at_vtx).collect()),
        );
        row.set(
            "L1Muon_phiAtVtx",
            ColumnValue::FloatArray(l1.iter().map(|c| c.phi_at_vtx).collect()),
        );
        row.set(
            "L1Muon_charge",
            ColumnValue::IntArray(l1.iter().map(|c| c.charge as i64).collect()),
        );
        row.set(
            "L1Muon_quality",
            ColumnValue::IntArray(l1.iter().map(|c| c.quality as i64).collect()),
        );
        row.set(
            "L1Muon_bx",
            ColumnValue::IntArray(l1.iter().map(|c| c.bunch_crossing as i64).collect()),
        );

        let l2 = event.l2_candidates.as_deref().unwrap_or(&[]);
        row.set(
            "nL2Muon",
            ColumnValue::Int(if event.l2_candidates.is_some() {
                l2.len() as i64
            } else {
                SENTINEL_I
            }),
        );
        row.set(
            "L2Muon_pt",
            ColumnValue::FloatArray(l2.iter().map(|c| c.pt).collect()),
        );
        row.set(
            "L2Muon_eta",
            ColumnValue::FloatArray(l2.iter().map(|c| c.eta).collect()),
        );
        row.set(
            "L2Muon_phi",
            ColumnValue::FloatArray(l2.iter().map(|c| c.phi).collect()),
        );
        row.set(
            "L2Muon_charge",
            ColumnValue::IntArray(l2.iter().map(|c| c.charge as i64).collect()),
        );
    }

    fn write_blocks(&self, row: &mut EventRow) {
        self.offline_vertices.write_into(row);
        self.candidate_vertices.write_into(row);
        self.from_l1_vertices.write_into(row);
        self.hits.write_into(row);
        self.muons.write_into(row);
        self.muons_no_id.write_into(row);
        for (_, tpl) in self.tracks.iter() {
            tpl.write_into(row);
        }
        for (_, tpl) in self.truths.iter() {
            tpl.write_into(row);
        }
        self.truth_muons.write_into(row);
        for (_, tpl) in self.seeds.iter() {
            tpl.write_into(row);
        }
    }
}

/// Resolve a starting state to its global-frame momentum and position
fn global_state(
    geometry: &dyn SurfaceGeometry,
    state: &TrajectoryState,
) -> (GlobalVector, GlobalPoint) {
    let p = geometry.to_global_vector(
        state.det_id,
        LocalVector {
            x: state.px as f64,
            y: state.py as f64,
            z: state.pz as f64,
        },
    );
    let x = geometry.to_global_point(
        state.det_id,
        LocalPoint {
            x: state.local_x as f64,
            y: state.local_y as f64,
            z: 0.0,
        },
    );
    (p, x)
}

fn write_beam_spot(row: &mut EventRow, bs: Option<&BeamSpot>) {
    let fields = match bs {
        Some(bs) => [
            ("bs_x0", bs.x0),
            ("bs_y0", bs.y0),
            ("bs_z0", bs.z0),
            ("bs_sigmaZ", bs.sigma_z),
            ("bs_dxdz", bs.dxdz),
            ("bs_dydz", bs.dydz),
            ("bs_x0Err", bs.x0_error),
            ("bs_y0Err", bs.y0_error),
            ("bs_z0Err", bs.z0_error),
            ("bs_sigmaZErr", bs.sigma_z_error),
            ("bs_dxdzErr", bs.dxdz_error),
            ("bs_dydzErr", bs.dydz_error),
        ],
        None => [
            ("bs_x0", SENTINEL_F),
            ("bs_y0", SENTINEL_F),
            ("bs_z0", SENTINEL_F),
            ("bs_sigmaZ", SENTINEL_F),
            ("bs_dxdz", SENTINEL_F),
            ("bs_dydz", SENTINEL_F),
            ("bs_x0Err", SENTINEL_F),
            ("bs_y0Err", SENTINEL_F),
            ("bs_z0Err", SENTINEL_F),
            ("bs_sigmaZErr", SENTINEL_F),
            ("bs_dxdzErr", SENTINEL_F),
            ("bs_dydzErr", SENTINEL_F),
        ],
    };
    for (name, value) in fields {
        row.set(name, ColumnValue::Float(value));
    }
}

/// Scoring needs the trigger-candidate collections its features come from;
/// from-L1 stages do without the L2 collection
fn scoring_context_available(event: &Event, stage: Stage) -> bool {
    event.l1_candidates.is_some() && (stage.is_from_l1() || event.l2_candidates.is_some())
}

fn seed_relations(event: &Event, p: GlobalVector, x: GlobalPoint) -> SeedRelations {
    compute_relations(
        p,
        x,
        event.l1_candidates.as_deref(),
        event.l2_candidates.as_deref(),
        event.gen_particles.as_deref(),
    )
}

/// Matched-track columns for the truth view, including the matched track's
/// seed score when the stage carries a scorer
fn matched_summary(
    geometry: &dyn SurfaceGeometry,
    scorer: Option<&SeedScorerPair>,
    event: &Event,
    trk: &Track,
    quality: f64,
    bs: Option<&BeamSpot>,
) -> MatchedTrackSummary {
    let (dxy_bs, dz_bs) = match bs {
        Some(bs) => (trk.dxy(bs), trk.dz(bs)),
        None => (SENTINEL_F, SENTINEL_F),
    };
    let mva = match (&trk.seed_state, scorer) {
        (Some(state), Some(scorer)) => {
            let (p, x) = global_state(geometry, state);
            let rel = seed_relations(event, p, x);
            scorer.score(p.perp(), p.eta(), &rel) + SCORE_SHIFT
        }
        _ => SENTINEL_F,
    };
    MatchedTrackSummary {
        pt: trk.pt,
        eta: trk.eta,
        phi: trk.phi,
        charge: trk.charge as i64,
        dxy_bs,
        dz_bs,
        normalized_chi2: trk.normalized_chi2(),
        quality,
        n_valid_hits: trk.n_valid_hits as i64,
        mva,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventId, Seed};
    use crate::geometry::SurfaceAtlas;
    use crate::store::MemoryStore;

    fn assembler() -> EventAssembler {
        EventAssembler::new(Arc::new(SurfaceAtlas::new()), ScorerSet::default())
    }

    fn empty_event() -> Event {
        Event::new(
            EventId {
                run: 346512,
                lumi_block: 12,
                event: 900144,
            },
            true,
        )
    }

    #[test]
    fn test_empty_event_commits_full_row() {
        let mut asm = assembler();
        let mut store = MemoryStore::new();
        asm.register_schema(&mut store).unwrap();
        asm.process(&empty_event(), &mut store).unwrap();

        assert_eq!(store.rows().len(), 1);
        let row = &store.rows()[0];
        assert_eq!(row.len(), asm.schema().len());
        assert_eq!(row.get("runNum"), Some(&ColumnValue::UInt(346512)));
        assert_eq!(row.get("truePU"), Some(&ColumnValue::Float(SENTINEL_F)));
        assert_eq!(row.get("nL1Muon"), Some(&ColumnValue::Int(SENTINEL_I)));
        assert_eq!(row.get("nPV"), Some(&ColumnValue::Int(0)));
    }

    #[test]
    fn test_seed_links_to_its_track() {
        let state = TrajectoryState {
            det_id: 77,
            pt: 9.0,
            local_x: 0.0,
            local_y: 0.0,
            dxdz: 0.0,
            dydz: 0.0,
            px: 9.0,
            py: 0.0,
            pz: 1.0,
            qbp: 0.11,
            charge: 1,
        };
        let mut ev = empty_event();
        ev.is_real_data = false;
        let mut products = crate::event::StageProducts::default();
        products.tracks = Some(vec![Track {
            pt: 9.1,
            eta: 0.1,
            phi: 0.0,
            charge: 1,
            px: 9.1,
            py: 0.0,
            pz: 0.9,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            chi2: 8.0,
            ndof: 4.0,
            valid_fraction: 1.0,
            n_valid_hits: 13,
            hit_pattern: Default::default(),
            dxy_error: 0.002,
            dz_error: 0.004,
            seed_state: Some(state),
        }]);
        products.seeds = Some(vec![Seed {
            starting_state: state,
        }]);
        ev.stages.insert(Stage::Iter0, products);

        let mut asm = assembler();
        let mut store = MemoryStore::new();
        asm.register_schema(&mut store).unwrap();
        asm.process(&ev, &mut store).unwrap();

        let row = &store.rows()[0];
        assert_eq!(
            row.get("hltIter0Seed_trackIndex"),
            Some(&ColumnValue::IntArray(vec![0]))
        );
        assert_eq!(
            row.get("hltIter0Seed_trk_pt"),
            Some(&ColumnValue::FloatArray(vec![9.1]))
        );
        // no truth in the event: dummy columns on the track side
        assert_eq!(
            row.get("hltIter0IterL3MuonTrack_matchedTPsize"),
            Some(&ColumnValue::IntArray(vec![0]))
        );
    }
}
