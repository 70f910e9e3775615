// Copyright © 2025 HQS Quantum Simulations GmbH. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the
// License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either
// express or implied. See the License for the specific language governing permissions and
// limitations under the License.

//! The gate catalog of romps.
//!
//! Gates are the atomic operations applied to the matrix-product state. The catalog is
//! a closed sum type: single-site Paulis and projectors, two-site entanglers
//! (Haar-random unitaries, CZ), the spin-1 total-spin sector projectors, and the two
//! composite stochastic gates `Measurement` and `Reset` that the apply engine unrolls
//! into one Born-sampled projection per site.
//!
//! A gate builds a [crate::mps::SiteOperator] against concrete RAM positions via
//! [Gate::build_operator]; randomness (Haar draws, sector sampling) comes from the
//! named streams handed in through [GateContext].

use crate::mps::{MatrixProductState, SiteOperator};
use crate::rng::{RngRegistry, StreamName};
use crate::RompsError;
use ndarray::Array2;
use num_complex::Complex64;

#[doc(hidden)]
mod single_site_gates;
pub use single_site_gates::*;
#[doc(hidden)]
mod two_site_gates;
pub use two_site_gates::*;

/// Measurement basis of the composite [Gate::Measurement].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MeasurementBasis {
    /// Pauli-X eigenbasis.
    X,
    /// Pauli-Y eigenbasis.
    Y,
    /// Computational (Pauli-Z) basis.
    Z,
}

impl std::fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementBasis::X => write!(f, "X"),
            MeasurementBasis::Y => write!(f, "Y"),
            MeasurementBasis::Z => write!(f, "Z"),
        }
    }
}

/// Runtime context handed to gates while building their operators.
///
/// Carries the random streams and, for gates whose construction depends on the current
/// state (Born-sampled sector measurements), read-only access to the MPS.
#[derive(Debug)]
pub struct GateContext<'a> {
    /// The named random streams of the running simulation.
    pub rng: &'a mut RngRegistry,
    /// Read-only view of the state, present during live execution.
    pub mps: Option<&'a MatrixProductState>,
}

/// A gate of the catalog.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Gate {
    /// Single-site Pauli-X.
    PauliX,
    /// Single-site Pauli-Y.
    PauliY,
    /// Single-site Pauli-Z.
    PauliZ,
    /// Two-site Haar-random unitary, drawn from the `haar` stream.
    HaarRandom,
    /// Single-site projector onto one local basis state; renormalizes the state.
    Projection {
        /// The 0-based local basis state projected onto.
        outcome: usize,
    },
    /// Two-site controlled-Z.
    CZ,
    /// Composite projective measurement, one Born draw per site from `born`.
    Measurement {
        /// The measurement basis.
        basis: MeasurementBasis,
    },
    /// Composite reset to |0>: a computational-basis measurement followed by a Pauli-X
    /// when the outcome was 1.
    Reset,
    /// Two-site projector onto a union of total-spin sectors of a spin-1 pair;
    /// renormalizes the state.
    SpinSectorProjection {
        /// The permitted total-spin sectors (subsets of {0, 1, 2}).
        sectors: Vec<usize>,
    },
    /// Born-sampled projective measurement of the total-spin sector of a spin-1 pair,
    /// drawn from `born`; renormalizes the state.
    SpinSectorMeasurement {
        /// The permitted total-spin sectors (subsets of {0, 1, 2}).
        sectors: Vec<usize>,
    },
}

impl Gate {
    /// Returns the number of physical sites the gate acts on.
    pub fn support(&self) -> usize {
        match self {
            Gate::PauliX
            | Gate::PauliY
            | Gate::PauliZ
            | Gate::Projection { .. }
            | Gate::Measurement { .. }
            | Gate::Reset => 1,
            Gate::HaarRandom
            | Gate::CZ
            | Gate::SpinSectorProjection { .. }
            | Gate::SpinSectorMeasurement { .. } => 2,
        }
    }

    /// Returns true when the apply engine must renormalize the state after this gate.
    ///
    /// Exactly the projective gates renormalize; unitary gates must not.
    pub fn requires_normalization(&self) -> bool {
        matches!(
            self,
            Gate::Projection { .. }
                | Gate::SpinSectorProjection { .. }
                | Gate::SpinSectorMeasurement { .. }
        )
    }

    /// Returns true for the composite gates that unroll into per-site Born
    /// measurements.
    pub fn is_composite(&self) -> bool {
        matches!(self, Gate::Measurement { .. } | Gate::Reset)
    }

    /// Short label used by circuit visualization.
    pub fn label(&self) -> String {
        match self {
            Gate::PauliX => "X".to_string(),
            Gate::PauliY => "Y".to_string(),
            Gate::PauliZ => "Z".to_string(),
            Gate::HaarRandom => "U".to_string(),
            Gate::Projection { outcome } => format!("P{outcome}"),
            Gate::CZ => "CZ".to_string(),
            Gate::Measurement { basis } => format!("M{basis}"),
            Gate::Reset => "R".to_string(),
            Gate::SpinSectorProjection { sectors } => format!("SP{sectors:?}"),
            Gate::SpinSectorMeasurement { sectors } => format!("SM{sectors:?}"),
        }
    }

    /// Builds the dense operator of the gate against concrete RAM positions.
    ///
    /// `ram_sites` must be strictly ascending and match the gate's support; the apply
    /// engine sorts the translated sites before calling. Composite gates never build a
    /// raw operator and reject the call; the engine routes them through the per-site
    /// measurement path instead.
    ///
    /// # Arguments
    ///
    /// * `ram_sites` - RAM positions the operator will act on, ascending.
    /// * `local_dim` - The local Hilbert dimension d.
    /// * `context` - Random streams and optional state access.
    ///
    /// # Returns
    ///
    /// * `Ok(SiteOperator)` - The built operator.
    /// * `Err(RompsError)` - Support mismatch, unsupported local dimension, or a
    ///   composite gate.
    pub fn build_operator(
        &self,
        ram_sites: &[usize],
        local_dim: usize,
        context: &mut GateContext<'_>,
    ) -> Result<SiteOperator, RompsError> {
        if ram_sites.len() != self.support() {
            return Err(RompsError::invalid_argument(format!(
                "gate {} acts on {} sites but {} were given",
                self.label(),
                self.support(),
                ram_sites.len()
            )));
        }
        let matrix = match self {
            Gate::PauliX => {
                require_qubit(local_dim, "PauliX")?;
                pauli_x()
            }
            Gate::PauliY => {
                require_qubit(local_dim, "PauliY")?;
                pauli_y()
            }
            Gate::PauliZ => {
                require_qubit(local_dim, "PauliZ")?;
                pauli_z()
            }
            Gate::Projection { outcome } => basis_projector(*outcome, local_dim)?,
            Gate::CZ => {
                require_qubit(local_dim, "CZ")?;
                cz_matrix()
            }
            Gate::HaarRandom => {
                let dim = local_dim * local_dim;
                haar_unitary(dim, context.rng.stream(StreamName::Haar))
            }
            Gate::SpinSectorProjection { sectors } => {
                require_spin_one(local_dim, "SpinSectorProjection")?;
                spin_sector_projector_sum(sectors)?
            }
            Gate::SpinSectorMeasurement { sectors } => {
                require_spin_one(local_dim, "SpinSectorMeasurement")?;
                let mps = context.mps.ok_or_else(|| {
                    RompsError::internal(
                        "SpinSectorMeasurement requires state access to sample a sector",
                    )
                })?;
                sample_spin_sector(sectors, ram_sites, mps, context.rng)?
            }
            Gate::Measurement { .. } | Gate::Reset => {
                return Err(RompsError::unsupported(format!(
                    "composite gate {} builds no operator for raw site lists; \
                     it is dispatched through the per-site measurement path",
                    self.label()
                )));
            }
        };
        SiteOperator::new(matrix, ram_sites.to_vec(), local_dim)
    }
}

fn require_qubit(local_dim: usize, gate: &str) -> Result<(), RompsError> {
    if local_dim != 2 {
        return Err(RompsError::unsupported(format!(
            "{gate} is only defined for local dimension 2, got {local_dim}"
        )));
    }
    Ok(())
}

fn require_spin_one(local_dim: usize, gate: &str) -> Result<(), RompsError> {
    if local_dim != 3 {
        return Err(RompsError::unsupported(format!(
            "{gate} is only defined for spin-1 sites (local dimension 3), got {local_dim}"
        )));
    }
    Ok(())
}

/// Born-samples a total-spin sector of a spin-1 pair and returns its projector.
///
/// Draws exactly once from the `born` stream. The sector probabilities are evaluated
/// on the live state; when their total mass falls below 1e-14 the measurement has
/// nothing to sample from and fails numerically.
fn sample_spin_sector(
    sectors: &[usize],
    ram_sites: &[usize],
    mps: &MatrixProductState,
    rng: &mut RngRegistry,
) -> Result<Array2<Complex64>, RompsError> {
    validate_sectors(sectors)?;
    let mut weights = Vec::with_capacity(sectors.len());
    for &sector in sectors {
        let projector = spin_sector_projector(sector)?;
        let weight = mps.expectation_block(ram_sites, &projector)?.re.max(0.0);
        weights.push(weight);
    }
    let total: f64 = weights.iter().sum();
    if total < 1e-14 {
        return Err(RompsError::numerical(format!(
            "no probability mass in permitted spin sectors {sectors:?}"
        )));
    }
    let draw = rng.draw(StreamName::Born) * total;
    let mut cumulative = 0.0;
    let mut selected = sectors[sectors.len() - 1];
    for (&sector, weight) in sectors.iter().zip(weights.iter()) {
        cumulative += weight;
        if draw < cumulative {
            selected = sector;
            break;
        }
    }
    spin_sector_projector(selected)
}

pub(crate) fn validate_sectors(sectors: &[usize]) -> Result<(), RompsError> {
    if sectors.is_empty() {
        return Err(RompsError::invalid_argument(
            "spin sector list must not be empty",
        ));
    }
    for &sector in sectors {
        if sector > 2 {
            return Err(RompsError::invalid_argument(format!(
                "spin sector {sector} does not exist for a spin-1 pair"
            )));
        }
    }
    let mut seen = [false; 3];
    for &sector in sectors {
        if seen[sector] {
            return Err(RompsError::invalid_argument(format!(
                "spin sector {sector} listed twice"
            )));
        }
        seen[sector] = true;
    }
    Ok(())
}
