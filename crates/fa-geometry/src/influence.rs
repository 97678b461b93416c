//! Influence matrix (Jacobian) from element forces to the resultant.

use crate::error::{GeometryError, GeometryResult};
use crate::mount::ElementMount;
use fa_core::{Axis, Resultant, ensure_finite, ensure_len};
use nalgebra::DMatrix;

const ROWS: usize = 6;

/// 6×n matrix mapping per-element force to `[Fx, Fy, Fz, Mx, My, Mz]`.
///
/// Always has exactly six rows and finite entries.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceMatrix {
    matrix: DMatrix<f64>,
}

impl InfluenceMatrix {
    /// Wrap an existing matrix after checking its shape and entries.
    pub fn from_matrix(matrix: DMatrix<f64>) -> GeometryResult<Self> {
        if matrix.nrows() != ROWS {
            return Err(GeometryError::RowCount {
                rows: matrix.nrows(),
            });
        }
        for v in matrix.iter() {
            ensure_finite(*v, "influence matrix entry")?;
        }
        Ok(Self { matrix })
    }

    /// Build from 6×n data in row-major order.
    pub fn from_row_major(data: &[f64]) -> GeometryResult<Self> {
        if data.len() % ROWS != 0 {
            return Err(GeometryError::RaggedMatrix { len: data.len() });
        }
        let n = data.len() / ROWS;
        Self::from_matrix(DMatrix::from_row_slice(ROWS, n, data))
    }

    /// Build from six equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> GeometryResult<Self> {
        if rows.len() != ROWS {
            return Err(GeometryError::RowCount { rows: rows.len() });
        }
        let n = rows[0].len();
        for row in rows {
            ensure_len(row, n, "influence row")?;
        }
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::from_row_major(&data)
    }

    /// One column `[u; p × u]` per mounted element.
    pub fn from_mounts(mounts: &[ElementMount]) -> GeometryResult<Self> {
        let mut matrix = DMatrix::zeros(ROWS, mounts.len());
        for (j, mount) in mounts.iter().enumerate() {
            for v in mount.position {
                ensure_finite(v, "element position")?;
            }
            let column = mount
                .influence_column()
                .ok_or(GeometryError::DegenerateDirection { index: j })?;
            for (i, v) in column.iter().enumerate() {
                matrix[(i, j)] = *v;
            }
        }
        Self::from_matrix(matrix)
    }

    pub fn n_elements(&self) -> usize {
        self.matrix.ncols()
    }

    /// Contribution of a unit force on `element` to the `axis` component.
    pub fn entry(&self, axis: Axis, element: usize) -> f64 {
        self.matrix[(axis.index(), element)]
    }

    /// Resultant produced by the full force vector.
    pub fn resultant(&self, forces: &[f64]) -> GeometryResult<Resultant> {
        self.resultant_excluding(forces, &vec![false; forces.len()])
    }

    /// Resultant produced by the elements not flagged in `excluded`.
    pub fn resultant_excluding(
        &self,
        forces: &[f64],
        excluded: &[bool],
    ) -> GeometryResult<Resultant> {
        ensure_len(forces, self.n_elements(), "force vector")?;
        ensure_len(excluded, self.n_elements(), "exclusion mask")?;
        let mut out = [0.0; ROWS];
        for (j, (&f, &skip)) in forces.iter().zip(excluded).enumerate() {
            if skip {
                continue;
            }
            for (i, slot) in out.iter_mut().enumerate() {
                *slot += self.matrix[(i, j)] * f;
            }
        }
        Ok(Resultant::new(out))
    }
}
