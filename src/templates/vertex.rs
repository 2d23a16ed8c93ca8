//! Vertex block: offline, candidate-side, and from-L1 collections

use super::{check_columns, RecordTemplate};
use crate::error::NtupleResult;
use crate::event::Vertex;
use crate::store::{ColumnKind, ColumnSpec, ColumnValue, EventRow};

#[derive(Debug, Clone, Default)]
pub struct VertexTemplate {
    prefix: &'static str,

    is_valid: Vec<i64>,
    chi2: Vec<f64>,
    ndof: Vec<f64>,
    n_tracks: Vec<i64>,
    x: Vec<f64>,
    x_error: Vec<f64>,
    y: Vec<f64>,
    y_error: Vec<f64>,
    z: Vec<f64>,
    z_error: Vec<f64>,
}

impl VertexTemplate {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            ..Self::default()
        }
    }

    pub fn fill(&mut self, v: &Vertex) -> usize {
        let row = self.x.len();
        self.is_valid.push(v.is_valid as i64);
        self.chi2.push(v.chi2);
        self.ndof.push(v.ndof);
        self.n_tracks.push(v.n_tracks as i64);
        self.x.push(v.x);
        self.x_error.push(v.x_error);
        self.y.push(v.y);
        self.y_error.push(v.y_error);
        self.z.push(v.z);
        self.z_error.push(v.z_error);
        row
    }

    fn name(&self, field: &str) -> String {
        format!("{}_{}", self.prefix, field)
    }

    fn columns(&self) -> [(&'static str, usize); 10] {
        [
            ("isValid", self.is_valid.len()),
            ("chi2", self.chi2.len()),
            ("ndof", self.ndof.len()),
            ("nTracks", self.n_tracks.len()),
            ("x", self.x.len()),
            ("xerr", self.x_error.len()),
            ("y", self.y.len()),
            ("yerr", self.y_error.len()),
            ("z", self.z.len()),
            ("zerr", self.z_error.len()),
        ]
    }
}

impl RecordTemplate for VertexTemplate {
    fn clear(&mut self) {
        let prefix = self.prefix;
        *self = Self::new(prefix);
    }

    fn len(&self) -> usize {
        self.x.len()
    }

    fn check_aligned(&self) -> NtupleResult<()> {
        check_columns(self.prefix, self.len(), &self.columns())
    }

    fn schema(&self) -> Vec<ColumnSpec> {
        let mut out = vec![ColumnSpec::new(format!("n{}", self.prefix), ColumnKind::Int)];
        for (field, _) in self.columns() {
            let kind = match field {
                "isValid" | "nTracks" => ColumnKind::IntArray,
                _ => ColumnKind::FloatArray,
            };
            out.push(ColumnSpec::new(self.name(field), kind));
        }
        out
    }

    fn write_into(&self, row: &mut EventRow) {
        row.set(
            format!("n{}", self.prefix),
            ColumnValue::Int(self.len() as i64),
        );
        row.set(self.name("isValid"), ColumnValue::IntArray(self.is_valid.clone()));
        row.set(self.name("chi2"), ColumnValue::FloatArray(self.chi2.clone()));
        row.set(self.name("ndof"), ColumnValue::FloatArray(self.ndof.clone()));
        row.set(self.name("nTracks"), ColumnValue::IntArray(self.n_tracks.clone()));
        row.set(self.name("x"), ColumnValue::FloatArray(self.x.clone()));
        row.set(self.name("xerr"), ColumnValue::FloatArray(self.x_error.clone()));
        row.set(self.name("y"), ColumnValue::FloatArray(self.y.clone()));
        row.set(self.name("yerr"), ColumnValue::FloatArray(self.y_error.clone()));
        row.set(self.name("z"), ColumnValue::FloatArray(self.z.clone()));
        row.set(self.name("zerr"), ColumnValue::FloatArray(self.z_error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_render() {
        let mut tpl = VertexTemplate::new("PV");
        tpl.fill(&Vertex {
            is_valid: true,
            chi2: 30.0,
            ndof: 20.0,
            n_tracks: 25,
            x: 0.1,
            x_error: 0.001,
            y: -0.05,
            y_error: 0.001,
            z: 2.0,
            z_error: 0.01,
        });
        tpl.check_aligned().unwrap();

        let mut row = EventRow::new();
        tpl.write_into(&mut row);
        assert_eq!(row.get("nPV"), Some(&ColumnValue::Int(1)));
        assert_eq!(row.get("PV_isValid"), Some(&ColumnValue::IntArray(vec![1])));
        assert_eq!(row.len(), tpl.schema().len());
    }
}
