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

//! The executor: runs symbolic circuits on a simulation state.
//!
//! [simulate] repeats a circuit `n_circuits` times on one state, drawing stochastic
//! branch selections from the state's `ctrl` stream with exactly the consumption
//! pattern of [crate::expand::expand_circuit], and offering a [RecordingContext] to the
//! recording predicate after every executed gate. Geometries are snapshotted at entry,
//! so the circuit itself is never mutated and may be reused for further trajectories.

use crate::apply::apply_to_sites;
use crate::circuit::{select_branch, Circuit, CircuitOperation};
use crate::operations::Gate;
use crate::state::SimulationState;
use crate::RompsError;
use std::sync::Arc;

/// Snapshot of the execution position offered to recording predicates.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    /// The 1-based circuit repetition index.
    pub step_idx: usize,
    /// Cumulative count of gate executions across all repetitions and steps.
    pub gate_idx: usize,
    /// The gate that was just executed.
    pub gate: Gate,
    /// True exactly on the last gate of the last operation of the last inner step of a
    /// repetition.
    pub is_step_boundary: bool,
}

/// Recording predicate deciding when observables are recorded.
#[derive(Clone)]
pub enum RecordWhen {
    /// Record once per repetition, at the step boundary.
    EveryStep,
    /// Record immediately after every gate application.
    EveryGate,
    /// Record once, at the step boundary of the last repetition.
    FinalOnly,
    /// Record at repetition end whenever the cumulative gate count hits a multiple of
    /// n during the repetition.
    EveryNGates(usize),
    /// Record at the step boundary of every n-th repetition.
    EveryNSteps(usize),
    /// Record at repetition end whenever the user function returns true for a context.
    Custom(Arc<dyn Fn(&RecordingContext) -> bool + Send + Sync>),
}

impl std::fmt::Debug for RecordWhen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordWhen::EveryStep => write!(f, "EveryStep"),
            RecordWhen::EveryGate => write!(f, "EveryGate"),
            RecordWhen::FinalOnly => write!(f, "FinalOnly"),
            RecordWhen::EveryNGates(n) => write!(f, "EveryNGates({n})"),
            RecordWhen::EveryNSteps(n) => write!(f, "EveryNSteps({n})"),
            RecordWhen::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl RecordWhen {
    /// Resolves a preset name.
    ///
    /// # Arguments
    ///
    /// * `name` - One of `every_step`, `every_gate`, `final_only`.
    ///
    /// # Returns
    ///
    /// * `Err(RompsError)` - The name is not a known preset.
    pub fn from_name(name: &str) -> Result<Self, RompsError> {
        match name {
            "every_step" => Ok(RecordWhen::EveryStep),
            "every_gate" => Ok(RecordWhen::EveryGate),
            "final_only" => Ok(RecordWhen::FinalOnly),
            other => Err(RompsError::invalid_argument(format!(
                "unknown recording preset {other}"
            ))),
        }
    }

    /// Validates predicate parameters.
    fn validate(&self) -> Result<(), RompsError> {
        match self {
            RecordWhen::EveryNGates(0) | RecordWhen::EveryNSteps(0) => Err(
                RompsError::invalid_argument("recording period must be at least one"),
            ),
            _ => Ok(()),
        }
    }

    /// Evaluates the predicate for one context.
    ///
    /// Returns `(set_flag, record_now)`: `record_now` asks for an immediate record
    /// (the every-gate case, which must fire inside compound-geometry loops), while
    /// `set_flag` arms the single record at repetition end.
    fn evaluate(&self, context: &RecordingContext, n_circuits: usize) -> (bool, bool) {
        match self {
            RecordWhen::EveryStep => (context.is_step_boundary, false),
            RecordWhen::EveryGate => (false, true),
            RecordWhen::FinalOnly => (
                context.is_step_boundary && context.step_idx == n_circuits,
                false,
            ),
            RecordWhen::EveryNGates(n) => (context.gate_idx % n == 0, false),
            RecordWhen::EveryNSteps(n) => {
                (context.is_step_boundary && context.step_idx % n == 0, false)
            }
            RecordWhen::Custom(predicate) => (predicate(context), false),
        }
    }

    /// Step-boundary decision when the last operation of a repetition executed no gate
    /// (a stochastic "do nothing" branch): the deferred presets still arm the record.
    fn arms_at_silent_boundary(&self, repetition: usize, n_circuits: usize) -> bool {
        match self {
            RecordWhen::EveryStep => true,
            RecordWhen::FinalOnly => repetition == n_circuits,
            RecordWhen::EveryNSteps(n) => repetition % n == 0,
            _ => false,
        }
    }
}

/// Runs a circuit on a state for a number of repetitions.
///
/// Per repetition the circuit's operations execute in source order for every inner
/// step. Stochastic operations draw exactly once from the state's stream named in the
/// operation, whether or not a branch is selected; this keeps stream consumption
/// byte-identical with [crate::expand::expand_circuit] seeded the same way. After
/// every executed gate the predicate sees a [RecordingContext]; armed predicates
/// produce one `record` call at repetition end, the every-gate predicate records
/// immediately.
///
/// On error the state is left well-defined but possibly partially evolved; callers
/// discard it when the trajectory is no longer meaningful.
///
/// # Arguments
///
/// * `circuit` - The circuit to run; geometries are snapshotted, the circuit is not
///   mutated.
/// * `state` - The initialized state of the trajectory.
/// * `n_circuits` - Number of repetitions, at least one.
/// * `record_when` - The recording predicate.
///
/// # Returns
///
/// * `Err(RompsError)` - Bad arguments, a circuit/state mismatch, or a gate failure.
pub fn simulate(
    circuit: &Circuit,
    state: &mut SimulationState,
    n_circuits: usize,
    record_when: &RecordWhen,
) -> Result<(), RompsError> {
    if n_circuits < 1 {
        return Err(RompsError::invalid_argument(
            "n_circuits must be at least one",
        ));
    }
    record_when.validate()?;
    if circuit.length() != state.length() || circuit.boundary_condition() != state.bc {
        return Err(RompsError::invalid_argument(format!(
            "circuit (L={}, bc={}) does not match state (L={}, bc={})",
            circuit.length(),
            circuit.boundary_condition(),
            state.length(),
            state.bc
        )));
    }
    let length = circuit.length();
    let bc = circuit.boundary_condition();
    let n_steps = circuit.n_steps();
    // Snapshot the operations so staircase and pointer state lives in this call, not
    // in the shared circuit.
    let mut operations: Vec<CircuitOperation> = circuit.operations().to_vec();
    let n_operations = operations.len();
    let mut gate_idx: usize = 0;
    for repetition in 1..=n_circuits {
        let mut should_record = false;
        for step in 1..=n_steps {
            for op_index in 0..n_operations {
                let closes_repetition = step == n_steps && op_index == n_operations - 1;
                let selected = match &mut operations[op_index] {
                    CircuitOperation::Deterministic { gate, geometry } => {
                        Some((gate.clone(), geometry))
                    }
                    CircuitOperation::Stochastic { stream, outcomes } => {
                        let draw = state.rng.draw(*stream);
                        select_branch(draw, outcomes).map(move |index| {
                            let outcome = &mut outcomes[index];
                            (outcome.gate.clone(), &mut outcome.geometry)
                        })
                    }
                };
                let mut executed_any = false;
                if let Some((gate, geometry)) = selected {
                    if geometry.is_compound() {
                        let elements = geometry.elements(length, bc)?;
                        let element_count = elements.len();
                        for (element_index, element) in elements.into_iter().enumerate() {
                            apply_to_sites(state, &gate, &element)?;
                            gate_idx += 1;
                            executed_any = true;
                            let context = RecordingContext {
                                step_idx: repetition,
                                gate_idx,
                                gate: gate.clone(),
                                is_step_boundary: closes_repetition
                                    && element_index == element_count - 1,
                            };
                            let (set_flag, record_now) =
                                record_when.evaluate(&context, n_circuits);
                            if record_now {
                                state.record(None)?;
                            }
                            if set_flag {
                                should_record = true;
                            }
                        }
                    } else {
                        let sites = geometry.sites(length, bc)?;
                        apply_to_sites(state, &gate, &sites)?;
                        geometry.advance(length, bc);
                        gate_idx += 1;
                        executed_any = true;
                        let context = RecordingContext {
                            step_idx: repetition,
                            gate_idx,
                            gate: gate.clone(),
                            is_step_boundary: closes_repetition,
                        };
                        let (set_flag, record_now) = record_when.evaluate(&context, n_circuits);
                        if record_now {
                            state.record(None)?;
                        }
                        if set_flag {
                            should_record = true;
                        }
                    }
                }
                if !executed_any
                    && closes_repetition
                    && record_when.arms_at_silent_boundary(repetition, n_circuits)
                {
                    should_record = true;
                }
            }
        }
        if should_record {
            state.record(None)?;
        }
    }
    Ok(())
}
