//! Tracker-hit block, resolved to the global frame at fill time

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::RecHit;
use crate::geometry::{LocalPoint, SurfaceGeometry};
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

#[derive(Debug, Clone, Default)]
pub struct HitTemplate {
    prefix: &'static str,

    is_valid: Vec<i64>,
    det_id: Vec<i64>,
    global_x: Vec<f64>,
    global_y: Vec<f64>,
    global_z: Vec<f64>,
}

impl HitTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn fill(&mut self, hit: &RecHit, geometry: &dyn SurfaceGeometry) -> usize {
        let row = self.det_id.len();
        let global = geometry.to_global_point(
            hit.det_id,
            LocalPoint {
                x: hit.local_x,
                y: hit.local_y,
                z: hit.local_z,
            },
        );
        self.is_valid.push(hit.is_valid as i64);
        self.det_id.push(hit.det_id as i64);
        self.global_x.push(global.x);
        self.global_y.push(global.y);
        self.global_z.push(global.z);
        row
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> [(&'static str, usize); 5] {
        [
            ("isValid", self.is_valid.len()),
            ("detId", self.det_id.len()),
            ("x", self.global_x.len()),
            ("y", self.global_y.len()),
            ("z", self.global_z.len()),
        ]
    }
}

impl RecordTemplate for HitTemplate {
    fn clear(&mut self) {
        let prefix = self.prefix;
        *self = Self::new(prefix);
    }

    fn len(&self) -> usize {
        self.det_id.len()
    }

    fn check_aligned(&self) -> NtupleResult<()> {
        check_columns(self.prefix, self.len(), &self.columns())
    }

    fn schema(&self) -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new(format!("n{}", self.prefix), ColumnKind::Int),
            ColumnSpec::new(self.name("isValid"), ColumnKind::IntArray),
            ColumnSpec::new(self.name("detId"), ColumnKind::IntArray),
            ColumnSpec::new(self.name("x"), ColumnKind::FloatArray),
            ColumnSpec::new(self.name("y"), ColumnKind::FloatArray),
            ColumnSpec::new(self.name("z"), ColumnKind::FloatArray),
        ]
    }

    fn write_into(&self, row: &mut EventRow) {
        row.set(
            format!("n{}", self.prefix),
            ColumnValue::Int(self.len() as i64),
        );
        row.set(self.name("isValid"), ColumnValue::IntArray(self.is_valid.clone()));
        row.set(self.name("detId"), ColumnValue::IntArray(self.det_id.clone()));
        row.set(self.name("x"), ColumnValue::FloatArray(self.global_x.clone()));
        row.set(self.name("y"), ColumnValue::FloatArray(self.global_y.clone()));
        row.set(self.name("z"), ColumnValue::FloatArray(self.global_z.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GlobalPoint, SurfaceAtlas, SurfacePlacement};

    #[test]
    fn test_fill_resolves_global_position() {
        let mut atlas = SurfaceAtlas::new();
        atlas.insert(
            3,
            SurfacePlacement {
                origin: GlobalPoint::new(10.0, 0.0, 0.0),
                rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            },
        );
        let mut tpl = HitTemplate::new("hit");
        tpl.fill(
            &RecHit {
                is_valid: true,
                det_id: 3,
                local_x: 1.0,
                local_y: 2.0,
                local_z: 0.0,
            },
            &atlas,
        );
        tpl.check_aligned().unwrap();

        let mut row = EventRow::new();
        tpl.write_into(&mut row);
        assert_eq!(row.get("hit_x"), Some(&ColumnValue::FloatArray(vec![11.0])));
        assert_eq!(row.get("hit_y"), Some(&ColumnValue::FloatArray(vec![2.0])));
    }
}
