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

//! Integration test for the public API of symbolic expansion.

use romps::basis::BoundaryCondition;
use romps::expand::expand_circuit;
use romps::geometry::{Geometry, Parity};
use romps::operations::Gate;
use romps::rng::StreamName;
use romps::{Circuit, CircuitBuilder, Outcome};

fn staircase_circuit(n_steps: usize) -> Circuit {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open).n_steps(n_steps);
    builder
        .apply(Gate::HaarRandom, Geometry::staircase_right(1))
        .unwrap();
    builder
        .apply(Gate::Reset, Geometry::single_site(2))
        .unwrap();
    builder.build()
}

#[test]
fn expansion_is_deterministic_for_a_seed() {
    let mut builder = CircuitBuilder::new(6, BoundaryCondition::Periodic).n_steps(64);
    builder
        .apply_with_prob(
            StreamName::Ctrl,
            vec![
                Outcome::new(0.4, Gate::HaarRandom, Geometry::staircase_right(1)),
                Outcome::new(0.4, Gate::CZ, Geometry::adjacent_pair(3)),
            ],
        )
        .unwrap();
    let circuit = builder.build();
    let first = expand_circuit(&circuit, 77).unwrap();
    let second = expand_circuit(&circuit, 77).unwrap();
    assert_eq!(first, second);
    // A different seed may and here does give a different branch pattern.
    let third = expand_circuit(&circuit, 78).unwrap();
    assert_ne!(first, third);
}

#[test]
fn expansion_has_one_entry_per_step() {
    let circuit = staircase_circuit(5);
    let expanded = expand_circuit(&circuit, 0).unwrap();
    assert_eq!(expanded.len(), 5);
    for step_ops in &expanded {
        assert_eq!(step_ops.len(), 2);
    }
}

#[test]
fn expansion_walks_staircases_without_mutating_the_circuit() {
    let circuit = staircase_circuit(4);
    let expanded = expand_circuit(&circuit, 0).unwrap();
    let staircase_sites: Vec<Vec<usize>> = expanded
        .iter()
        .map(|step_ops| step_ops[0].sites.clone())
        .collect();
    assert_eq!(
        staircase_sites,
        vec![vec![1, 2], vec![2, 3], vec![3, 4], vec![1, 2]]
    );
    // A second expansion starts from the recorded position again.
    let again = expand_circuit(&circuit, 0).unwrap();
    assert_eq!(again[0][0].sites, vec![1, 2]);
}

#[test]
fn compound_geometries_emit_one_op_per_element() {
    let mut builder = CircuitBuilder::new(6, BoundaryCondition::Open).n_steps(1);
    builder
        .apply(Gate::CZ, Geometry::bricklayer(Parity::Nn))
        .unwrap();
    builder.apply(Gate::Reset, Geometry::AllSites).unwrap();
    let circuit = builder.build();
    let expanded = expand_circuit(&circuit, 1).unwrap();
    // Five brick pairs plus six single-site resets.
    assert_eq!(expanded[0].len(), 11);
    assert_eq!(expanded[0][0].sites, vec![1, 2]);
    assert_eq!(expanded[0][5].sites, vec![1]);
    assert_eq!(expanded[0][5].label, "R");
}

#[test]
fn certain_outcome_is_always_selected() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open).n_steps(16);
    builder
        .apply_with_prob(
            StreamName::Ctrl,
            vec![Outcome::new(1.0, Gate::PauliX, Geometry::single_site(1))],
        )
        .unwrap();
    let circuit = builder.build();
    let expanded = expand_circuit(&circuit, 5).unwrap();
    for step_ops in &expanded {
        assert_eq!(step_ops.len(), 1);
        assert_eq!(step_ops[0].gate, Gate::PauliX);
    }
}

#[test]
fn zero_probability_outcome_never_fires_but_consumes_draws() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open).n_steps(16);
    builder
        .apply_with_prob(
            StreamName::Ctrl,
            vec![Outcome::new(0.0, Gate::PauliX, Geometry::single_site(1))],
        )
        .unwrap();
    builder
        .apply_with_prob(
            StreamName::Ctrl,
            vec![Outcome::new(1.0, Gate::PauliZ, Geometry::single_site(2))],
        )
        .unwrap();
    let circuit = builder.build();
    let expanded = expand_circuit(&circuit, 5).unwrap();
    for step_ops in &expanded {
        // Only the certain operation fires; the dead branch stays silent yet the
        // expansion remains deterministic because its draw still happened.
        assert_eq!(step_ops.len(), 1);
        assert_eq!(step_ops[0].gate, Gate::PauliZ);
    }
}

#[test]
fn labels_follow_the_gate_catalog() {
    let circuit = staircase_circuit(1);
    let expanded = expand_circuit(&circuit, 0).unwrap();
    assert_eq!(expanded[0][0].label, "U");
    assert_eq!(expanded[0][1].label, "R");
}

#[test]
fn invalid_geometry_positions_fail_before_any_draw() {
    let mut builder = CircuitBuilder::new(4, BoundaryCondition::Open).n_steps(1);
    builder
        .apply(Gate::CZ, Geometry::adjacent_pair(4))
        .unwrap();
    let circuit = builder.build();
    assert!(expand_circuit(&circuit, 0).is_err());
}
