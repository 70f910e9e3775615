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

//! Symbolic expansion of circuits into concrete per-step operations.
//!
//! Expansion resolves a circuit under a seed without touching any simulation state:
//! deterministic operations compute their sites through the pure site computer,
//! stochastic operations consume exactly one draw from a dedicated seeded stream and
//! select their branch with the same rule the executor uses. The result is suitable
//! for diagrams and for test harnesses that predict which gates a trajectory will run.

use crate::circuit::{select_branch, Circuit, CircuitOperation};
use crate::geometry::Geometry;
use crate::operations::Gate;
use crate::RompsError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One concrete gate application produced by expansion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpandedOp {
    /// The 1-based inner step the application belongs to.
    pub step: usize,
    /// The applied gate.
    pub gate: Gate,
    /// The physical sites the gate acts on.
    pub sites: Vec<usize>,
    /// Short label for visualization.
    pub label: String,
}

/// Expands a circuit into one list of concrete operations per inner step.
///
/// Deterministic for a given circuit and seed. Staircase positions are evaluated as
/// "`step - 1` advances from the recorded start", so expansion never mutates the
/// circuit's geometries. A stochastic operation that selects the implicit "do nothing"
/// branch emits nothing for that step but still consumes its draw.
///
/// # Arguments
///
/// * `circuit` - The circuit to expand.
/// * `seed` - Seed of the dedicated expansion stream.
///
/// # Returns
///
/// * `Ok(Vec<Vec<ExpandedOp>>)` - One entry per inner step, each the ordered list of
///   gate applications of that step.
/// * `Err(RompsError)` - A geometry of the circuit is invalid for its chain.
pub fn expand_circuit(
    circuit: &Circuit,
    seed: u64,
) -> Result<Vec<Vec<ExpandedOp>>, RompsError> {
    validate_geometries(circuit)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut steps = Vec::with_capacity(circuit.n_steps());
    for step in 1..=circuit.n_steps() {
        let mut expanded = Vec::new();
        for operation in circuit.operations() {
            match operation {
                CircuitOperation::Deterministic { gate, geometry } => {
                    emit(&mut expanded, step, gate, geometry, circuit)?;
                }
                CircuitOperation::Stochastic { outcomes, .. } => {
                    let draw = rng.random::<f64>();
                    if let Some(index) = select_branch(draw, outcomes) {
                        let outcome = &outcomes[index];
                        emit(&mut expanded, step, &outcome.gate, &outcome.geometry, circuit)?;
                    }
                }
            }
        }
        steps.push(expanded);
    }
    Ok(steps)
}

/// Emits the expanded operations of one gate/geometry pair for one step.
fn emit(
    expanded: &mut Vec<ExpandedOp>,
    step: usize,
    gate: &Gate,
    geometry: &Geometry,
    circuit: &Circuit,
) -> Result<(), RompsError> {
    let length = circuit.length();
    let bc = circuit.boundary_condition();
    if geometry.is_compound() {
        for element in geometry.elements(length, bc)? {
            expanded.push(ExpandedOp {
                step,
                gate: gate.clone(),
                sites: element,
                label: gate.label(),
            });
        }
    } else {
        let sites = geometry.compute_sites(step, length, bc)?;
        expanded.push(ExpandedOp {
            step,
            gate: gate.clone(),
            sites,
            label: gate.label(),
        });
    }
    Ok(())
}

/// Validates every geometry of the circuit before any stream is consumed.
fn validate_geometries(circuit: &Circuit) -> Result<(), RompsError> {
    let length = circuit.length();
    let bc = circuit.boundary_condition();
    if length < 2 {
        return Err(RompsError::invalid_argument(format!(
            "circuits need a chain of at least 2 sites, got {length}"
        )));
    }
    let mut check = |geometry: &Geometry| -> Result<(), RompsError> {
        if geometry.is_compound() {
            geometry.elements(length, bc).map(|_| ())
        } else {
            geometry.compute_sites(1, length, bc).map(|_| ())
        }
    };
    for operation in circuit.operations() {
        match operation {
            CircuitOperation::Deterministic { geometry, .. } => check(geometry)?,
            CircuitOperation::Stochastic { outcomes, .. } => {
                for outcome in outcomes {
                    check(&outcome.geometry)?;
                }
            }
        }
    }
    Ok(())
}
