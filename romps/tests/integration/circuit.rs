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

//! Integration test for the public API of symbolic circuits and their builder.

use romps::basis::BoundaryCondition;
use romps::geometry::{Geometry, Parity};
use romps::operations::{Gate, MeasurementBasis};
use romps::rng::StreamName;
use romps::{select_branch, CircuitBuilder, CircuitOperation, Outcome, RompsError};

fn haar_on_staircase() -> (Gate, Geometry) {
    (Gate::HaarRandom, Geometry::staircase_right(1))
}

#[test]
fn builder_records_operations_in_source_order() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open).n_steps(2);
    let (gate, geometry) = haar_on_staircase();
    builder.apply(gate, geometry).unwrap();
    builder
        .apply(Gate::Reset, Geometry::single_site(2))
        .unwrap();
    let circuit = builder.build();
    assert_eq!(circuit.length(), 4);
    assert_eq!(circuit.n_steps(), 2);
    assert_eq!(circuit.len(), 2);
    assert!(matches!(
        circuit.operations()[0],
        CircuitOperation::Deterministic {
            gate: Gate::HaarRandom,
            ..
        }
    ));
    assert!(matches!(
        circuit.operations()[1],
        CircuitOperation::Deterministic {
            gate: Gate::Reset,
            ..
        }
    ));
}

#[test]
fn builder_carries_opaque_parameters() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open)
        .param("p_ctrl", 0.25)
        .param("p_proj", 0.5);
    builder
        .apply(Gate::PauliX, Geometry::single_site(1))
        .unwrap();
    let circuit = builder.build();
    assert_eq!(circuit.param("p_ctrl"), Some(0.25));
    assert_eq!(circuit.param("p_proj"), Some(0.5));
    assert_eq!(circuit.param("missing"), None);
    assert_eq!(circuit.params().len(), 2);
}

#[test]
fn stochastic_operations_only_draw_from_ctrl() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let outcome = Outcome::new(0.5, Gate::PauliX, Geometry::single_site(1));
    let result = builder.apply_with_prob(StreamName::Born, vec![outcome]);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn empty_outcome_list_is_rejected() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let result = builder.apply_with_prob(StreamName::Ctrl, vec![]);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn probability_sum_above_one_is_rejected() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let outcomes = vec![
        Outcome::new(0.7, Gate::PauliX, Geometry::single_site(1)),
        Outcome::new(0.4, Gate::PauliZ, Geometry::single_site(2)),
    ];
    let result = builder.apply_with_prob(StreamName::Ctrl, outcomes);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn probability_sum_below_one_keeps_a_do_nothing_branch() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let outcomes = vec![Outcome::new(
        0.3,
        Gate::PauliX,
        Geometry::single_site(1),
    )];
    builder.apply_with_prob(StreamName::Ctrl, outcomes).unwrap();
    let circuit = builder.build();
    assert_eq!(circuit.len(), 1);
}

#[test]
fn negative_probability_is_rejected() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let outcomes = vec![Outcome::new(-0.1, Gate::PauliX, Geometry::single_site(1))];
    assert!(builder.apply_with_prob(StreamName::Ctrl, outcomes).is_err());
}

#[test]
fn gate_support_must_match_geometry_width() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    // Two-site gate on a single site.
    assert!(builder.apply(Gate::CZ, Geometry::single_site(1)).is_err());
    // Single-site gate on a pair geometry.
    assert!(builder
        .apply(Gate::PauliX, Geometry::adjacent_pair(1))
        .is_err());
}

#[test]
fn composite_gates_reject_pair_geometries() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    let result = builder.apply(
        Gate::Measurement {
            basis: MeasurementBasis::Z,
        },
        Geometry::bricklayer(Parity::Odd),
    );
    assert!(matches!(result, Err(RompsError::Unsupported { .. })));
    // All-sites expands to single sites and is fine.
    builder
        .apply(
            Gate::Measurement {
                basis: MeasurementBasis::Z,
            },
            Geometry::AllSites,
        )
        .unwrap();
}

#[test]
fn select_branch_uses_strict_cumulative_rule() {
    let outcomes = vec![
        Outcome::new(0.25, Gate::PauliX, Geometry::single_site(1)),
        Outcome::new(0.25, Gate::PauliZ, Geometry::single_site(2)),
    ];
    assert_eq!(select_branch(0.0, &outcomes), Some(0));
    assert_eq!(select_branch(0.2499, &outcomes), Some(0));
    assert_eq!(select_branch(0.25, &outcomes), Some(1));
    assert_eq!(select_branch(0.4999, &outcomes), Some(1));
    // The residual mass is the implicit do-nothing branch.
    assert_eq!(select_branch(0.5, &outcomes), None);
    assert_eq!(select_branch(0.999, &outcomes), None);
}

#[test]
fn display_lists_gates_and_geometries() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open);
    builder
        .apply(Gate::HaarRandom, Geometry::staircase_right(1))
        .unwrap();
    let circuit = builder.build();
    let text = format!("{circuit}");
    assert!(text.contains("L=4"));
    assert!(text.contains("StaircaseRight(1"));
}

#[cfg(feature = "serialize")]
#[test]
fn circuits_round_trip_through_serde_json() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Periodic)
        .n_steps(3)
        .param("p", 0.1);
    builder
        .apply(Gate::HaarRandom, Geometry::staircase_right(1))
        .unwrap();
    builder
        .apply_with_prob(
            StreamName::Ctrl,
            vec![Outcome::new(
                0.5,
                Gate::CZ,
                Geometry::bricklayer(Parity::Even),
            )],
        )
        .unwrap();
    let circuit = builder.build();
    let serialized = serde_json::to_string(&circuit).unwrap();
    let deserialized: romps::Circuit = serde_json::from_str(&serialized).unwrap();
    assert_eq!(circuit, deserialized);
}
