//! Synthetic event generation
//!
//! Produces events that exercise the whole assembly path without any
//! upstream reconstruction: a few truth muons per event, smeared tracks
//! grown from them in every stage, seeds whose starting states are
//! bit-identical to the ones stored on the tracks, candidate muons built
//! from the first stage's tracks, and association tables wired to the
//! truth particles the tracks came from. Deterministic for a fixed seed.

use crate::event::{
    BeamSpot, CombinedQuality, Event, EventId, GenParticle, HitPattern, L1Candidate, L2Candidate,
    MuonCandidate, PileupSummary, Seed, StageProducts, Track, TrajectoryState, TruthParticle,
    Vertex,
};
use crate::stage::Stage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::PI;

pub struct SyntheticEventSource {
    rng: StdRng,
    run: u32,
    next_event: u64,
}

impl SyntheticEventSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            run: 1,
            next_event: 1,
        }
    }

    pub fn generate(&mut self, count: usize) -> Vec<Event> {
        (0..count).map(|_| self.next()).collect()
    }

    pub fn next(&mut self) -> Event {
        let id = EventId {
            run: self.run,
            lumi_block: 1 + (self.next_event / 100) as u32,
            event: self.next_event,
        };
        self.next_event += 1;

        let mut event = Event::new(id, false);
        event.beam_spot = Some(self.beam_spot());
        event.pileup = Some(vec![PileupSummary {
            bunch_crossing: 0,
            true_interactions: self.rng.gen_range(20.0..60.0),
        }]);
        event.offline_vertices = Some(self.vertices(3));
        event.candidate_vertices = Some(self.vertices(2));
        event.from_l1_vertices = Some(self.vertices(2));

        let n_truth = self.rng.gen_range(1..=3);
        let truth = self.truth_muons(n_truth);
        event.gen_particles = Some(truth.iter().filter_map(|tp| tp.gen().copied()).collect());
        event.l1_candidates = Some(self.l1_from_truth(&truth));
        event.l2_candidates = Some(self.l2_from_truth(&truth));

        let mut first_stage_tracks = Vec::new();
        for stage in Stage::all() {
            let products = self.stage_products(&truth);
            if stage == Stage::Iter0 {
                if let Some(tracks) = &products.tracks {
                    first_stage_tracks = tracks.clone();
                }
            }
            event.stages.insert(stage, products);
        }
        event.muons = Some(self.muons_from_tracks(&first_stage_tracks));
        event.truth_particles = Some(truth);
        event
    }

    fn beam_spot(&mut self) -> BeamSpot {
        BeamSpot {
            x0: self.rng.gen_range(-0.1..0.1),
            y0: self.rng.gen_range(-0.1..0.1),
            z0: self.rng.gen_range(-1.0..1.0),
            sigma_z: 3.5,
            dxdz: 0.0,
            dydz: 0.0,
            x0_error: 0.001,
            y0_error: 0.001,
            z0_error: 0.01,
            sigma_z_error: 0.01,
            dxdz_error: 1e-5,
            dydz_error: 1e-5,
        }
    }

    fn vertices(&mut self, count: usize) -> Vec<Vertex> {
        (0..count)
            .map(|_| Vertex {
                is_valid: true,
                chi2: self.rng.gen_range(5.0..50.0),
                ndof: self.rng.gen_range(4.0..40.0),
                n_tracks: self.rng.gen_range(3..60),
                x: self.rng.gen_range(-0.1..0.1),
                x_error: 0.002,
                y: self.rng.gen_range(-0.1..0.1),
                y_error: 0.002,
                z: self.rng.gen_range(-10.0..10.0),
                z_error: 0.01,
            })
            .collect()
    }

    fn truth_muons(&mut self, count: usize) -> Vec<TruthParticle> {
        (0..count)
            .map(|_| {
                let pt = self.rng.gen_range(3.0..50.0);
                let eta: f64 = self.rng.gen_range(-2.4..2.4);
                let phi = self.rng.gen_range(-PI..PI);
                let charge: f32 = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                let energy = pt * eta.cosh();
                TruthParticle {
                    charge,
                    pdg_id: if charge > 0.0 { -13 } else { 13 },
                    status: 1,
                    energy,
                    pt,
                    eta,
                    phi,
                    vx: 0.0,
                    vy: 0.0,
                    vz: self.rng.gen_range(-5.0..5.0),
                    n_hits: self.rng.gen_range(20..40),
                    n_tracker_hits: self.rng.gen_range(12..20),
                    n_tracker_layers: self.rng.gen_range(8..14),
                    bunch_crossing: 0,
                    event_index: 0,
                    gen_links: vec![GenParticle {
                        charge,
                        pdg_id: if charge > 0.0 { -13 } else { 13 },
                        status: 1,
                        pt,
                        eta,
                        phi,
                        vx: 0.0,
                        vy: 0.0,
                        vz: 0.0,
                    }],
                }
            })
            .collect()
    }

    fn l1_from_truth(&mut self, truth: &[TruthParticle]) -> Vec<L1Candidate> {
        truth
            .iter()
            .map(|tp| L1Candidate {
                pt: tp.pt * self.rng.gen_range(0.8..1.2),
                eta: tp.eta + self.rng.gen_range(-0.05..0.05),
                phi: tp.phi + self.rng.gen_range(-0.05..0.05),
                eta_at_vtx: tp.eta + self.rng.gen_range(-0.02..0.02),
                phi_at_vtx: tp.phi + self.rng.gen_range(-0.02..0.02),
                charge: tp.charge as i32,
                quality: 12,
                bunch_crossing: 0,
            })
            .collect()
    }

    fn l2_from_truth(&mut self, truth: &[TruthParticle]) -> Vec<L2Candidate> {
        truth
            .iter()
            .map(|tp| L2Candidate {
                pt: tp.pt * self.rng.gen_range(0.9..1.1),
                eta: tp.eta + self.rng.gen_range(-0.02..0.02),
                phi: tp.phi + self.rng.gen_range(-0.02..0.02),
                charge: tp.charge as i32,
            })
            .collect()
    }

    /// Tracks grown from the truth muons, with seeds carrying the exact
    /// same starting states and associations pointing back at the truth
    fn stage_products(&mut self, truth: &[TruthParticle]) -> StageProducts {
        let mut tracks = Vec::new();
        let mut seeds = Vec::new();
        let mut reco_to_sim: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
        let mut sim_to_reco: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();

        for (ti, tp) in truth.iter().enumerate() {
            // each stage reconstructs a truth muon with 80% efficiency
            if !self.rng.gen_bool(0.8) {
                continue;
            }
            let pt = tp.pt * self.rng.gen_range(0.95..1.05);
            let eta = tp.eta + self.rng.gen_range(-0.01..0.01);
            let phi = tp.phi + self.rng.gen_range(-0.01..0.01);
            let state = self.seed_state(pt, eta, phi, tp.charge as i32);
            seeds.push(Seed {
                starting_state: state,
            });

            let ri = tracks.len();
            tracks.push(Track {
                pt,
                eta,
                phi,
                charge: tp.charge as i32,
                px: pt * phi.cos(),
                py: pt * phi.sin(),
                pz: pt * eta.sinh(),
                vx: 0.0,
                vy: 0.0,
                vz: tp.vz,
                chi2: self.rng.gen_range(5.0..30.0),
                ndof: self.rng.gen_range(4.0..20.0),
                valid_fraction: self.rng.gen_range(0.9..1.0),
                n_valid_hits: tp.n_tracker_hits,
                hit_pattern: HitPattern {
                    tracker_layers: tp.n_tracker_layers,
                    tracker_hits: tp.n_tracker_hits,
                    pixel_layers: 4,
                    pixel_hits: 4,
                    ..Default::default()
                },
                dxy_error: 0.002,
                dz_error: 0.004,
                seed_state: Some(state),
            });

            let fraction = self.rng.gen_range(0.7..1.0);
            reco_to_sim.insert(ri, vec![(ti, fraction)]);
            sim_to_reco.insert(ti, vec![(ri, fraction)]);
        }

        let association =
            crate::association::TruthAssociation::from_ranked(reco_to_sim, sim_to_reco);
        StageProducts {
            tracks: Some(tracks),
            seeds: Some(seeds),
            track_association: Some(association.clone()),
            seed_association: Some(association),
        }
    }

    fn seed_state(&mut self, pt: f64, eta: f64, phi: f64, charge: i32) -> TrajectoryState {
        TrajectoryState {
            det_id: self.rng.gen_range(300_000_000..310_000_000),
            pt: pt as f32,
            local_x: self.rng.gen_range(-1.0..1.0),
            local_y: self.rng.gen_range(-1.0..1.0),
            dxdz: self.rng.gen_range(-0.1..0.1),
            dydz: self.rng.gen_range(-0.1..0.1),
            px: (pt * phi.cos()) as f32,
            py: (pt * phi.sin()) as f32,
            pz: (pt * eta.sinh()) as f32,
            qbp: (charge as f64 / (pt * eta.cosh())) as f32,
            charge,
        }
    }

    fn muons_from_tracks(&mut self, tracks: &[Track]) -> Vec<MuonCandidate> {
        tracks
            .iter()
            .map(|trk| MuonCandidate {
                pt: trk.pt,
                eta: trk.eta,
                phi: trk.phi,
                charge: trk.charge,
                is_global: true,
                is_standalone: true,
                is_tracker: true,
                inner: Some(trk.clone()),
                global: Some(trk.clone()),
                quality: CombinedQuality {
                    momentum_chi2: self.rng.gen_range(0.0..10.0),
                    position_chi2: self.rng.gen_range(0.0..10.0),
                    glb_kink: self.rng.gen_range(0.0..100.0),
                    glb_track_probability: self.rng.gen_range(0.0..1.0),
                    global_delta_eta_phi: self.rng.gen_range(0.0..0.1),
                    local_distance: self.rng.gen_range(0.0..1.0),
                    sta_rel_chi2: self.rng.gen_range(0.0..5.0),
                    tight_match: self.rng.gen_bool(0.9),
                    trk_kink: self.rng.gen_range(0.0..100.0),
                    trk_rel_chi2: self.rng.gen_range(0.0..5.0),
                    segment_compatibility: self.rng.gen_range(0.0..1.0),
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let a = SyntheticEventSource::new(7).next();
        let b = SyntheticEventSource::new(7).next();
        assert_eq!(a.id, b.id);
        assert_eq!(a.truth_particles, b.truth_particles);
    }

    #[test]
    fn test_seeds_match_track_states() {
        let ev = SyntheticEventSource::new(3).next();
        for stage in Stage::all() {
            let products = ev.stage(stage).unwrap();
            let tracks = products.tracks.as_ref().unwrap();
            let seeds = products.seeds.as_ref().unwrap();
            assert_eq!(tracks.len(), seeds.len());
            for (trk, seed) in tracks.iter().zip(seeds) {
                assert_eq!(trk.seed_state, Some(seed.starting_state));
            }
        }
    }

    #[test]
    fn test_associations_point_at_truth() {
        let mut src = SyntheticEventSource::new(11);
        // find an event with at least one reconstructed track
        let ev = (0..20)
            .map(|_| src.next())
            .find(|ev| {
                ev.stage(Stage::Iter0)
                    .and_then(|p| p.tracks.as_ref())
                    .is_some_and(|t| !t.is_empty())
            })
            .unwrap();
        let truth = ev.truth_particles.as_ref().unwrap();
        let products = ev.stage(Stage::Iter0).unwrap();
        let assoc = products.track_association.as_ref().unwrap();
        let m = assoc.best_match(0).unwrap();
        assert!(m.truth_index < truth.len());
        assert!(m.shared_fraction > 0.0);
    }
}
