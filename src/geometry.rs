//! Detector coordinate frames and angular helpers
//!
//! Trajectory states are recorded in the local frame of the detector surface
//! that produced them. Everything downstream (eta/phi matching against L1/L2
//! candidates, the barrel/endcap scoring split) needs global-frame momenta
//! and positions, so the crate consumes a per-surface transform oracle:
//! surface id -> (rotation, translation).
//!
//! Conventions:
//! - pseudorapidity eta = -ln(tan(theta/2)), theta measured from +z
//! - azimuth phi in (-pi, pi]
//! - deltaR = sqrt(dEta^2 + dPhi^2) with dPhi wrapped

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Momentum vector in the local frame of a detector surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Position on a detector surface (z is normal to the surface plane)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Momentum vector in the global detector frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Position in the global detector frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GlobalVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Transverse component
    pub fn perp(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn mag(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Pseudorapidity; saturates for vectors along the beam axis
    pub fn eta(&self) -> f64 {
        eta_from_components(self.perp(), self.z)
    }

    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl GlobalPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn perp(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn eta(&self) -> f64 {
        eta_from_components(self.perp(), self.z)
    }

    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

fn eta_from_components(perp: f64, z: f64) -> f64 {
    if perp.abs() < 1e-12 {
        return if z >= 0.0 { f64::INFINITY } else { f64::NEG_INFINITY };
    }
    (z / perp).asinh()
}

/// Shortest signed azimuthal difference, wrapped to (-pi, pi]
#[inline]
pub fn delta_phi(phi1: f64, phi2: f64) -> f64 {
    let mut d = phi1 - phi2;
    while d > PI {
        d -= 2.0 * PI;
    }
    while d <= -PI {
        d += 2.0 * PI;
    }
    d
}

/// Angular separation in the eta-phi plane
#[inline]
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let de = eta1 - eta2;
    let dp = delta_phi(phi1, phi2);
    (de * de + dp * dp).sqrt()
}

/// Placement of one detector surface in the global frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePlacement {
    /// Surface origin in the global frame
    pub origin: GlobalPoint,
    /// Row-major local-to-global rotation matrix
    pub rotation: [[f64; 3]; 3],
}

impl SurfacePlacement {
    /// Surface coincident with the global frame
    pub fn identity() -> Self {
        Self {
            origin: GlobalPoint::new(0.0, 0.0, 0.0),
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    fn rotate(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let r = &self.rotation;
        (
            r[0][0] * x + r[0][1] * y + r[0][2] * z,
            r[1][0] * x + r[1][1] * y + r[1][2] * z,
            r[2][0] * x + r[2][1] * y + r[2][2] * z,
        )
    }
}

/// Read-only coordinate-transform oracle keyed by detector-surface id.
///
/// Shared across events (and across workers, if events are ever processed in
/// parallel); implementations must be safe for concurrent read-only use.
pub trait SurfaceGeometry: Send + Sync {
    fn to_global_vector(&self, det_id: u32, local: LocalVector) -> GlobalVector;
    fn to_global_point(&self, det_id: u32, local: LocalPoint) -> GlobalPoint;
}

/// Surface-id -> placement table. Unregistered surfaces fall back to the
/// identity placement, so transforms never fail mid-event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceAtlas {
    placements: HashMap<u32, SurfacePlacement>,
}

impl SurfaceAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, det_id: u32, placement: SurfacePlacement) {
        self.placements.insert(det_id, placement);
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    fn placement(&self, det_id: u32) -> SurfacePlacement {
        self.placements
            .get(&det_id)
            .copied()
            .unwrap_or_else(SurfacePlacement::identity)
    }
}

impl SurfaceGeometry for SurfaceAtlas {
    fn to_global_vector(&self, det_id: u32, local: LocalVector) -> GlobalVector {
        let p = self.placement(det_id);
        let (x, y, z) = p.rotate(local.x, local.y, local.z);
        GlobalVector::new(x, y, z)
    }

    fn to_global_point(&self, det_id: u32, local: LocalPoint) -> GlobalPoint {
        let p = self.placement(det_id);
        let (x, y, z) = p.rotate(local.x, local.y, local.z);
        GlobalPoint::new(x + p.origin.x, y + p.origin.y, z + p.origin.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_phi_wraps() {
        assert!((delta_phi(PI - 0.1, -PI + 0.1) - (-0.2)).abs() < 1e-12);
        assert!((delta_phi(0.3, 0.1) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_eta_sign_follows_z() {
        let fwd = GlobalVector::new(1.0, 0.0, 10.0);
        let bwd = GlobalVector::new(1.0, 0.0, -10.0);
        assert!(fwd.eta() > 0.0);
        assert!((fwd.eta() + bwd.eta()).abs() < 1e-12);
    }

    #[test]
    fn test_identity_atlas_passthrough() {
        let atlas = SurfaceAtlas::new();
        let v = atlas.to_global_vector(42, LocalVector { x: 1.0, y: 2.0, z: 3.0 });
        assert_eq!(v, GlobalVector::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotated_surface() {
        let mut atlas = SurfaceAtlas::new();
        // 90-degree rotation about z, shifted along x
        atlas.insert(
            7,
            SurfacePlacement {
                origin: GlobalPoint::new(5.0, 0.0, 0.0),
                rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            },
        );
        let p = atlas.to_global_point(7, LocalPoint { x: 1.0, y: 0.0, z: 0.0 });
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);

        // vectors rotate but do not translate
        let v = atlas.to_global_vector(7, LocalVector { x: 1.0, y: 0.0, z: 0.0 });
        assert!((v.x - 0.0).abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }
}
