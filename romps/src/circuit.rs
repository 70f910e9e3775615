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

use crate::basis::BoundaryCondition;
use crate::geometry::Geometry;
use crate::operations::Gate;
use crate::rng::StreamName;
use crate::RompsError;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};

/// Tolerance on probability sums of stochastic operations.
pub(crate) const PROBABILITY_SUM_EPS: f64 = 1e-9;

/// One branch of a stochastic circuit operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// Probability of this branch being selected.
    pub probability: f64,
    /// The gate applied when the branch is selected.
    pub gate: Gate,
    /// The geometry the gate is applied over.
    pub geometry: Geometry,
}

impl Outcome {
    /// Creates an outcome branch.
    pub fn new(probability: f64, gate: Gate, geometry: Geometry) -> Self {
        Self {
            probability,
            gate,
            geometry,
        }
    }
}

/// One operation of a symbolic circuit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum CircuitOperation {
    /// A gate applied unconditionally over a geometry.
    Deterministic {
        /// The gate to apply.
        gate: Gate,
        /// The geometry the gate is applied over.
        geometry: Geometry,
    },
    /// A branch selected by one draw from a named random stream.
    ///
    /// Probabilities may sum to less than one; the residual mass is an implicit
    /// "do nothing" branch.
    Stochastic {
        /// The stream the selection draw comes from.
        stream: StreamName,
        /// The branches, in selection order.
        outcomes: Vec<Outcome>,
    },
}

/// Selects the branch of a stochastic operation for one uniform draw.
///
/// Iterates the outcomes accumulating probability mass and returns the first branch
/// whose cumulative mass strictly exceeds the draw; `None` means the implicit
/// "do nothing" branch. This is the single selection rule shared by symbolic expansion
/// and live execution, which is what keeps their stream consumption aligned.
///
/// # Arguments
///
/// * `draw` - A uniform draw in [0, 1).
/// * `outcomes` - The branches, in selection order.
pub fn select_branch(draw: f64, outcomes: &[Outcome]) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, outcome) in outcomes.iter().enumerate() {
        cumulative += outcome.probability;
        if draw < cumulative {
            return Some(index);
        }
    }
    None
}

/// Validates the outcome list of a stochastic operation.
pub(crate) fn validate_outcomes(outcomes: &[Outcome]) -> Result<(), RompsError> {
    if outcomes.is_empty() {
        return Err(RompsError::invalid_argument(
            "stochastic operation needs at least one outcome",
        ));
    }
    let mut sum = 0.0;
    for outcome in outcomes {
        if outcome.probability < 0.0 {
            return Err(RompsError::invalid_argument(format!(
                "outcome probability {} is negative",
                outcome.probability
            )));
        }
        sum += outcome.probability;
    }
    if sum > 1.0 + PROBABILITY_SUM_EPS {
        return Err(RompsError::invalid_argument(format!(
            "outcome probabilities sum to {sum}, above one"
        )));
    }
    Ok(())
}

/// A symbolic monitored circuit.
///
/// A circuit records what a trajectory does without touching any state: an ordered
/// list of deterministic and stochastic operations over a chain of fixed length and
/// boundary condition, repeated for `n_steps` inner steps per run. Circuits are built
/// once with [CircuitBuilder] and consumed many times by
/// [crate::expand::expand_circuit] and [crate::execute::simulate].
///
/// A circuit is logically immutable, but staircase and pointer geometries stored in it
/// carry mutable position state. A circuit holding such geometries must not be shared
/// between concurrent executors; [crate::execute::simulate] snapshots the geometries at
/// entry so the stored circuit itself is never mutated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Circuit {
    /// Number of physical sites L.
    length: usize,
    /// Boundary condition of the chain.
    bc: BoundaryCondition,
    /// Number of inner steps per repetition.
    n_steps: usize,
    /// The operations, in application order.
    operations: Vec<CircuitOperation>,
    /// Opaque user parameters carried along with the circuit; never interpreted by the
    /// engine.
    params: HashMap<String, f64>,
}

impl Circuit {
    /// Returns the number of physical sites.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the boundary condition of the chain.
    pub fn boundary_condition(&self) -> BoundaryCondition {
        self.bc
    }

    /// Returns the number of inner steps per repetition.
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Returns the operations in application order.
    pub fn operations(&self) -> &[CircuitOperation] {
        &self.operations
    }

    /// Returns the number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true when the circuit holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the opaque user parameter map.
    pub fn params(&self) -> &HashMap<String, f64> {
        &self.params
    }

    /// Returns one user parameter.
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }
}

/// Implements the Display trait for Circuit.
impl Display for Circuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "Circuit(L={}, bc={}, n_steps={})",
            self.length, self.bc, self.n_steps
        );
        for operation in &self.operations {
            match operation {
                CircuitOperation::Deterministic { gate, geometry } => {
                    let _ = writeln!(text, "  {} on {}", gate.label(), geometry);
                }
                CircuitOperation::Stochastic { stream, outcomes } => {
                    let _ = writeln!(text, "  with probability from {stream}:");
                    for outcome in outcomes {
                        let _ = writeln!(
                            text,
                            "    {:.4} -> {} on {}",
                            outcome.probability,
                            outcome.gate.label(),
                            outcome.geometry
                        );
                    }
                }
            }
        }
        write!(f, "{text}")
    }
}

/// Builder recording the operations of a [Circuit].
///
/// Validations happen at record time: gate support must match the geometry's element
/// width, stochastic operations may only draw from the `ctrl` stream, outcome lists
/// must be non-empty with probabilities summing to at most one.
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    length: usize,
    bc: BoundaryCondition,
    n_steps: usize,
    operations: Vec<CircuitOperation>,
    params: HashMap<String, f64>,
}

impl CircuitBuilder {
    /// Creates a builder for a chain of `length` sites under the given boundary
    /// condition, with one inner step.
    pub fn new(length: usize, bc: BoundaryCondition) -> Self {
        Self {
            length,
            bc,
            n_steps: 1,
            operations: Vec::new(),
            params: HashMap::new(),
        }
    }

    /// Sets the number of inner steps per repetition.
    pub fn n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Stores one opaque user parameter.
    pub fn param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Records a deterministic operation.
    ///
    /// # Arguments
    ///
    /// * `gate` - The gate to apply.
    /// * `geometry` - The geometry the gate is applied over.
    ///
    /// # Returns
    ///
    /// * `Ok(&mut Self)` - The builder, for chaining.
    /// * `Err(RompsError)` - The gate's support does not fit the geometry.
    pub fn apply(&mut self, gate: Gate, geometry: Geometry) -> Result<&mut Self, RompsError> {
        check_gate_geometry(&gate, &geometry)?;
        self.operations
            .push(CircuitOperation::Deterministic { gate, geometry });
        Ok(self)
    }

    /// Records a stochastic operation drawing from the `ctrl` stream.
    ///
    /// # Arguments
    ///
    /// * `stream` - The selection stream; only [StreamName::Ctrl] is accepted.
    /// * `outcomes` - The branches, non-empty, probabilities summing to at most one.
    ///
    /// # Returns
    ///
    /// * `Ok(&mut Self)` - The builder, for chaining.
    /// * `Err(RompsError)` - Unsupported stream, empty outcome list, bad
    ///   probabilities, or a gate/geometry mismatch in a branch.
    pub fn apply_with_prob(
        &mut self,
        stream: StreamName,
        outcomes: Vec<Outcome>,
    ) -> Result<&mut Self, RompsError> {
        if stream != StreamName::Ctrl {
            return Err(RompsError::invalid_argument(format!(
                "stochastic operations may only draw from ctrl, got {stream}"
            )));
        }
        validate_outcomes(&outcomes)?;
        for outcome in &outcomes {
            check_gate_geometry(&outcome.gate, &outcome.geometry)?;
        }
        self.operations
            .push(CircuitOperation::Stochastic { stream, outcomes });
        Ok(self)
    }

    /// Finishes the recording and returns the circuit.
    pub fn build(&self) -> Circuit {
        Circuit {
            length: self.length,
            bc: self.bc,
            n_steps: self.n_steps,
            operations: self.operations.clone(),
            params: self.params.clone(),
        }
    }
}

/// Checks that a gate's support matches the element width of a geometry.
fn check_gate_geometry(gate: &Gate, geometry: &Geometry) -> Result<(), RompsError> {
    let element_width = match geometry {
        Geometry::SingleSite { .. } | Geometry::AllSites => 1,
        Geometry::AdjacentPair { .. }
        | Geometry::NextNearestNeighbor { .. }
        | Geometry::Bricklayer { .. }
        | Geometry::StaircaseLeft { .. }
        | Geometry::StaircaseRight { .. }
        | Geometry::Pointer { .. } => 2,
    };
    if gate.is_composite() && element_width != 1 {
        return Err(RompsError::unsupported(format!(
            "composite gate {} measures single sites and cannot run on {}",
            gate.label(),
            geometry
        )));
    }
    if gate.support() != element_width {
        return Err(RompsError::invalid_argument(format!(
            "gate {} acts on {} sites but geometry {} supplies {element_width}",
            gate.label(),
            gate.support(),
            geometry
        )));
    }
    Ok(())
}
