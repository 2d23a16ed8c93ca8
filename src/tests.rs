//! End-to-end assembly tests over hand-built and synthetic events

use crate::assembler::EventAssembler;
use crate::association::TruthAssociation;
use crate::config::{ClassifierConfig, JobConfig, ScaleSet, ScorerConfig};
use crate::event::{
    Event, EventId, MuonCandidate, Seed, StageProducts, Track, TrajectoryState, TruthParticle,
    SENTINEL_F, SENTINEL_I,
};
use crate::geometry::SurfaceAtlas;
use crate::scoring::FEATURE_COUNT;
use crate::stage::Stage;
use crate::store::{ColumnValue, MemoryStore};
use crate::synthetic::SyntheticEventSource;
use std::collections::HashMap;
use std::sync::Arc;

fn assembler() -> EventAssembler {
    EventAssembler::new(Arc::new(SurfaceAtlas::new()), Default::default())
}

fn event() -> Event {
    Event::new(
        EventId {
            run: 320001,
            lumi_block: 5,
            event: 42,
        },
        false,
    )
}

fn state(det_id: u32, pt: f32) -> TrajectoryState {
    TrajectoryState {
        det_id,
        pt,
        local_x: 0.3,
        local_y: -0.1,
        dxdz: 0.0,
        dydz: 0.0,
        px: pt,
        py: 0.0,
        pz: pt * 0.2,
        qbp: 1.0 / pt,
        charge: 1,
    }
}

fn track(pt: f64, seed_state: Option<TrajectoryState>) -> Track {
    Track {
        pt,
        eta: 0.2,
        phi: 0.0,
        charge: 1,
        px: pt,
        py: 0.0,
        pz: pt * 0.2,
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
        chi2: 10.0,
        ndof: 5.0,
        valid_fraction: 1.0,
        n_valid_hits: 14,
        hit_pattern: Default::default(),
        dxy_error: 0.002,
        dz_error: 0.004,
        seed_state,
    }
}

fn truth_muon(pt: f64) -> TruthParticle {
    TruthParticle {
        charge: -1.0,
        pdg_id: 13,
        status: 1,
        energy: pt * 1.02,
        pt,
        eta: 0.2,
        phi: 0.0,
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
        n_hits: 28,
        n_tracker_hits: 16,
        n_tracker_layers: 11,
        bunch_crossing: 0,
        event_index: 0,
        gen_links: vec![],
    }
}

fn process(ev: &Event) -> MemoryStore {
    let mut asm = assembler();
    let mut store = MemoryStore::new();
    asm.register_schema(&mut store).unwrap();
    asm.process(ev, &mut store).unwrap();
    store
}

#[test]
fn test_synthetic_events_flatten_cleanly() {
    let mut asm = assembler();
    let mut store = MemoryStore::new();
    asm.register_schema(&mut store).unwrap();
    for ev in SyntheticEventSource::new(17).generate(5) {
        asm.process(&ev, &mut store).unwrap();
    }
    assert_eq!(store.rows().len(), 5);
    let width = store.schema().unwrap().len();
    for row in store.rows() {
        assert_eq!(row.len(), width);
    }
}

#[test]
fn test_candidate_links_resolve_through_fingerprints() {
    // one candidate muon whose inner track shares its starting state with
    // the Iter0 track: the track row must link back to candidate row 0
    let shared = state(501, 8.0);
    let mut ev = event();
    let inner = track(8.1, Some(shared));
    ev.muons = Some(vec![MuonCandidate {
        pt: 8.1,
        eta: 0.2,
        phi: 0.0,
        charge: 1,
        is_global: true,
        is_standalone: true,
        is_tracker: true,
        inner: Some(inner.clone()),
        global: None,
        quality: crate::event::CombinedQuality {
            momentum_chi2: 0.0,
            position_chi2: 0.0,
            glb_kink: 0.0,
            glb_track_probability: 0.0,
            global_delta_eta_phi: 0.0,
            local_distance: 0.0,
            sta_rel_chi2: 0.0,
            tight_match: true,
            trk_kink: 0.0,
            trk_rel_chi2: 0.0,
            segment_compatibility: 1.0,
        },
    }]);
    ev.stages.insert(
        Stage::Iter0,
        StageProducts {
            tracks: Some(vec![track(4.0, Some(state(502, 4.0))), inner]),
            seeds: Some(vec![
                Seed {
                    starting_state: shared,
                },
                Seed {
                    starting_state: state(999, 1.0),
                },
            ]),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    // track 0 has an unrelated fingerprint, track 1 matches the candidate
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_linkToCand"),
        Some(&ColumnValue::IntArray(vec![-1, 0]))
    );
    // seed 0 shares the candidate's state and resolves to track row 1;
    // seed 1 matches nothing
    assert_eq!(
        row.get("hltIter0Seed_trackIndex"),
        Some(&ColumnValue::IntArray(vec![1, -1]))
    );
    assert_eq!(
        row.get("hltIter0Seed_trk_pt"),
        Some(&ColumnValue::FloatArray(vec![8.1, SENTINEL_F]))
    );
}

#[test]
fn test_best_truth_match_wins_on_shared_fraction() {
    let mut ev = event();
    ev.truth_particles = Some(vec![truth_muon(9.5), truth_muon(10.5)]);

    let mut reco_to_sim = HashMap::new();
    reco_to_sim.insert(0usize, vec![(1usize, 0.9), (0usize, 0.4)]);
    let mut sim_to_reco = HashMap::new();
    sim_to_reco.insert(1usize, vec![(0usize, 0.9)]);

    ev.stages.insert(
        Stage::Iter2,
        StageProducts {
            tracks: Some(vec![track(10.0, None)]),
            track_association: Some(TruthAssociation::from_ranked(reco_to_sim, sim_to_reco)),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    assert_eq!(
        row.get("hltIter2IterL3MuonTrack_bestMatchTP_pt"),
        Some(&ColumnValue::FloatArray(vec![10.5]))
    );
    assert_eq!(
        row.get("hltIter2IterL3MuonTrack_bestMatchTP_sharedFraction"),
        Some(&ColumnValue::FloatArray(vec![0.9]))
    );
    assert_eq!(
        row.get("hltIter2IterL3MuonTrack_matchedTPsize"),
        Some(&ColumnValue::IntArray(vec![2]))
    );
    // the matched truth muon records its best track, the other one dummies
    assert_eq!(
        row.get("hltIter2IterL3MuonTrackTP_bestMatchTrk_pt"),
        Some(&ColumnValue::FloatArray(vec![SENTINEL_F, 10.0]))
    );
}

#[test]
fn test_missing_truth_collection_gives_sentinels() {
    let mut ev = event();
    ev.stages.insert(
        Stage::Iter0,
        StageProducts {
            tracks: Some(vec![track(6.0, None)]),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_matchedTPsize"),
        Some(&ColumnValue::IntArray(vec![0]))
    );
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_bestMatchTP_pdgId"),
        Some(&ColumnValue::IntArray(vec![SENTINEL_I]))
    );
    assert_eq!(row.get("nTP"), Some(&ColumnValue::Int(0)));
}

fn constant_classifier(bias: f64) -> ClassifierConfig {
    ClassifierConfig {
        weights: vec![0.0; FEATURE_COUNT],
        bias,
        scale: ScaleSet {
            mean: vec![0.0; FEATURE_COUNT],
            std: vec![1.0; FEATURE_COUNT],
        },
    }
}

#[test]
fn test_seed_scores_dispatch_on_eta_and_shift() {
    let cfg = JobConfig {
        iter2: Some(ScorerConfig {
            barrel: constant_classifier(1.0),
            endcap: constant_classifier(-1.0),
        }),
        iter2_from_l1: None,
    };
    let mut asm = EventAssembler::new(
        Arc::new(SurfaceAtlas::new()),
        cfg.build_scorers().unwrap(),
    );

    // barrel seed: momentum along x (eta 0); endcap seed: strongly forward
    let barrel = state(1, 5.0);
    let mut endcap = state(2, 5.0);
    endcap.pz = 50.0;

    let mut ev = event();
    ev.l1_candidates = Some(vec![]);
    ev.l2_candidates = Some(vec![]);
    ev.stages.insert(
        Stage::Iter2,
        StageProducts {
            seeds: Some(vec![
                Seed {
                    starting_state: barrel,
                },
                Seed {
                    starting_state: endcap,
                },
            ]),
            ..Default::default()
        },
    );
    // a non-scoring stage keeps the sentinel
    ev.stages.insert(
        Stage::Iter3,
        StageProducts {
            seeds: Some(vec![Seed {
                starting_state: state(3, 5.0),
            }]),
            ..Default::default()
        },
    );

    let mut store = MemoryStore::new();
    asm.register_schema(&mut store).unwrap();
    asm.process(&ev, &mut store).unwrap();

    let row = &store.rows()[0];
    assert_eq!(
        row.get("hltIter2Seed_mva"),
        Some(&ColumnValue::FloatArray(vec![1.5, -0.5]))
    );
    assert_eq!(
        row.get("hltIter3Seed_mva"),
        Some(&ColumnValue::FloatArray(vec![SENTINEL_F]))
    );
}

#[test]
fn test_seed_truth_association_fills_tp_columns() {
    let mut ev = event();
    ev.truth_particles = Some(vec![truth_muon(9.5), truth_muon(10.5)]);

    let mut reco_to_sim = HashMap::new();
    reco_to_sim.insert(0usize, vec![(1usize, 0.9)]);
    let sim_to_reco = HashMap::new();

    ev.stages.insert(
        Stage::Iter0,
        StageProducts {
            seeds: Some(vec![
                Seed {
                    starting_state: state(501, 8.0),
                },
                Seed {
                    starting_state: state(502, 4.0),
                },
            ]),
            seed_association: Some(TruthAssociation::from_ranked(reco_to_sim, sim_to_reco)),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    assert_eq!(
        row.get("hltIter0Seed_matchedTPsize"),
        Some(&ColumnValue::IntArray(vec![1, 0]))
    );
    assert_eq!(
        row.get("hltIter0Seed_bestMatchTP_pt"),
        Some(&ColumnValue::FloatArray(vec![10.5, SENTINEL_F]))
    );
    assert_eq!(
        row.get("hltIter0Seed_bestMatchTP_sharedFraction"),
        Some(&ColumnValue::FloatArray(vec![0.9, SENTINEL_F]))
    );
    assert_eq!(
        row.get("hltIter0Seed_bestMatchTP_pdgId"),
        Some(&ColumnValue::IntArray(vec![13, SENTINEL_I]))
    );
}

#[test]
fn test_scoring_skipped_without_trigger_candidates() {
    // same scorer setup as the dispatch test, but the event carries no L1
    // or L2 collections, so the score column stays at the sentinel
    let cfg = JobConfig {
        iter2: Some(ScorerConfig {
            barrel: constant_classifier(1.0),
            endcap: constant_classifier(-1.0),
        }),
        iter2_from_l1: None,
    };
    let mut asm = EventAssembler::new(
        Arc::new(SurfaceAtlas::new()),
        cfg.build_scorers().unwrap(),
    );

    let mut ev = event();
    ev.stages.insert(
        Stage::Iter2,
        StageProducts {
            seeds: Some(vec![Seed {
                starting_state: state(1, 5.0),
            }]),
            ..Default::default()
        },
    );

    let mut store = MemoryStore::new();
    asm.register_schema(&mut store).unwrap();
    asm.process(&ev, &mut store).unwrap();
    assert_eq!(
        store.rows()[0].get("hltIter2Seed_mva"),
        Some(&ColumnValue::FloatArray(vec![SENTINEL_F]))
    );
}

#[test]
fn test_three_tracks_two_matched_one_unmatched() {
    let mut ev = event();
    ev.truth_particles = Some(vec![truth_muon(9.5), truth_muon(20.0)]);

    let mut reco_to_sim = HashMap::new();
    reco_to_sim.insert(0usize, vec![(0usize, 0.8)]);
    reco_to_sim.insert(2usize, vec![(1usize, 0.95)]);
    let mut sim_to_reco = HashMap::new();
    sim_to_reco.insert(0usize, vec![(0usize, 0.8)]);
    sim_to_reco.insert(1usize, vec![(2usize, 0.95)]);

    ev.stages.insert(
        Stage::Iter0,
        StageProducts {
            tracks: Some(vec![track(9.0, None), track(3.0, None), track(19.0, None)]),
            track_association: Some(TruthAssociation::from_ranked(reco_to_sim, sim_to_reco)),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    assert_eq!(
        row.get("nhltIter0IterL3MuonTrack"),
        Some(&ColumnValue::Int(3))
    );
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_matchedTPsize"),
        Some(&ColumnValue::IntArray(vec![1, 0, 1]))
    );
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_bestMatchTP_sharedFraction"),
        Some(&ColumnValue::FloatArray(vec![0.8, SENTINEL_F, 0.95]))
    );
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_bestMatchTP_pt"),
        Some(&ColumnValue::FloatArray(vec![9.5, SENTINEL_F, 20.0]))
    );
    // every other per-track column carries exactly three entries too
    assert_eq!(
        row.get("hltIter0IterL3MuonTrack_pt"),
        Some(&ColumnValue::FloatArray(vec![9.0, 3.0, 19.0]))
    );
}

#[test]
fn test_stages_do_not_share_identity_maps() {
    // the same starting state in two stages resolves within each stage only
    let shared = state(600, 7.0);
    let mut ev = event();
    ev.stages.insert(
        Stage::Iter0,
        StageProducts {
            tracks: Some(vec![track(7.0, Some(shared))]),
            seeds: Some(vec![Seed {
                starting_state: shared,
            }]),
            ..Default::default()
        },
    );
    ev.stages.insert(
        Stage::Iter3,
        StageProducts {
            seeds: Some(vec![Seed {
                starting_state: shared,
            }]),
            ..Default::default()
        },
    );

    let store = process(&ev);
    let row = &store.rows()[0];
    assert_eq!(
        row.get("hltIter0Seed_trackIndex"),
        Some(&ColumnValue::IntArray(vec![0]))
    );
    // no Iter3 track collection: the seed stays unlinked
    assert_eq!(
        row.get("hltIter3Seed_trackIndex"),
        Some(&ColumnValue::IntArray(vec![-1]))
    );
}
