//! YAML allocation case files.
//!
//! ```yaml
//! layout:
//!   ring: { count: 16, radius: 1.0 }
//! segments: [1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8]
//! retracted: [5]
//! bounds: { lower: 0.0, upper: 1000.0 }
//! target:
//!   command: { thrust: 1000.0, x: 0.3, y: 0.2 }
//! solver: { reference: equal_share }
//! ```

use crate::error::{CliError, CliResult};
use fa_control::{CylinderLimits, ThrustCommand};
use fa_core::{Resultant, ensure_len};
use fa_geometry::{AngleUnit, ElementMount, GeometryError, InfluenceMatrix, Segmentation};
use fa_solver::{AllocConfig, AllocationProblem, Bounds};
use serde::Deserialize;
use std::path::Path;

/// Element layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Evenly spaced ring, numbered clockwise from the top
    Ring { count: usize, radius: f64 },
    /// `[radius, angle]` per element
    Polar {
        #[serde(default)]
        unit: AngleUnit,
        elements: Vec<[f64; 2]>,
    },
    /// `[x, y]` per axial element
    Axial(Vec<[f64; 2]>),
    /// Explicit mounts with arbitrary lines of action
    Mounts(Vec<ElementMount>),
    /// Six rows of the influence matrix
    Influence(Vec<Vec<f64>>),
}

impl Layout {
    pub fn influence(&self) -> CliResult<InfluenceMatrix> {
        let matrix = match self {
            Layout::Ring { count, radius } => {
                if *count == 0 || !(radius.is_finite() && *radius > 0.0) {
                    return Err(GeometryError::InvalidLayout {
                        what: "ring needs at least one element and a positive radius",
                    }
                    .into());
                }
                InfluenceMatrix::from_mounts(&ElementMount::ring(*count, *radius))?
            }
            Layout::Polar { unit, elements } => {
                let mounts: Vec<_> = elements
                    .iter()
                    .map(|[r, theta]| ElementMount::polar(*r, *theta, *unit))
                    .collect();
                InfluenceMatrix::from_mounts(&mounts)?
            }
            Layout::Axial(points) => {
                let mounts: Vec<_> = points
                    .iter()
                    .map(|[x, y]| ElementMount::axial(*x, *y))
                    .collect();
                InfluenceMatrix::from_mounts(&mounts)?
            }
            Layout::Mounts(mounts) => InfluenceMatrix::from_mounts(mounts)?,
            Layout::Influence(rows) => InfluenceMatrix::from_rows(rows)?,
        };
        Ok(matrix)
    }
}

/// Force bounds, scalar or one entry per element (retracted ones included).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoundsSpec {
    Cylinder { cylinder: CylinderLimits },
    Explicit { lower: Bounds, upper: Bounds },
}

impl BoundsSpec {
    fn full_length(&self) -> CliResult<(Bounds, Bounds)> {
        match self {
            BoundsSpec::Cylinder { cylinder } => Ok(cylinder.bounds()?),
            BoundsSpec::Explicit { lower, upper } => Ok((lower.clone(), upper.clone())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSpec {
    /// `[Fx, Fy, Fz, Mx, My, Mz]`
    Resultant(Resultant),
    /// Thrust at a point of application
    Command(ThrustCommand),
}

impl TargetSpec {
    fn resultant(&self) -> CliResult<Resultant> {
        match self {
            TargetSpec::Resultant(r) => Ok(*r),
            TargetSpec::Command(cmd) => Ok(cmd.target()?),
        }
    }
}

/// One allocation case as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub layout: Layout,
    /// Segment label per element; every element alone when omitted
    #[serde(default)]
    pub segments: Option<Vec<i64>>,
    /// Indices of retracted elements
    #[serde(default)]
    pub retracted: Vec<usize>,
    pub bounds: BoundsSpec,
    /// Previous forces; all ones when omitted
    #[serde(default)]
    pub previous: Option<Vec<f64>>,
    pub target: TargetSpec,
    #[serde(default)]
    pub solver: AllocConfig,
}

impl Case {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::CaseFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Resolve the layout, masks and bounds into owned solver inputs.
    pub fn prepare(&self) -> CliResult<PreparedCase> {
        let influence = self.layout.influence()?;
        let n = influence.n_elements();

        let segments = match &self.segments {
            Some(labels) => {
                ensure_len(labels, n, "segment labels")?;
                Segmentation::new(labels.clone())
            }
            None => Segmentation::unsegmented(n),
        };

        let mut retracted = vec![false; n];
        for &i in &self.retracted {
            let slot = retracted.get_mut(i).ok_or_else(|| {
                CliError::InvalidCase(format!("retracted index {i} out of range for {n} elements"))
            })?;
            *slot = true;
        }

        let previous = self.previous.clone().unwrap_or_else(|| vec![1.0; n]);
        if previous.len() != n {
            return Err(CliError::InvalidCase(format!(
                "previous forces have {} entries for {} elements",
                previous.len(),
                n
            )));
        }

        let (lower, upper) = self.bounds.full_length()?;
        let lower = lower.restrict_to_active(&retracted)?;
        let upper = upper.restrict_to_active(&retracted)?;

        Ok(PreparedCase {
            influence,
            segments,
            retracted,
            previous,
            lower,
            upper,
            target: self.target.resultant()?,
            config: self.solver,
        })
    }
}

/// Owned inputs for one solver call.
#[derive(Debug, Clone)]
pub struct PreparedCase {
    pub influence: InfluenceMatrix,
    pub segments: Segmentation,
    pub retracted: Vec<bool>,
    pub previous: Vec<f64>,
    /// Restricted to the active elements
    pub lower: Bounds,
    pub upper: Bounds,
    pub target: Resultant,
    pub config: AllocConfig,
}

impl PreparedCase {
    pub fn problem(&self) -> AllocationProblem<'_> {
        AllocationProblem {
            previous: &self.previous,
            target: self.target,
            influence: &self.influence,
            segments: &self.segments,
            retracted: &self.retracted,
            lower: &self.lower,
            upper: &self.upper,
        }
    }
}
