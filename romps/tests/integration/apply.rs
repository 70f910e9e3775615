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

//! Integration test for the public API of the gate-application engine.

use romps::apply::{apply, apply_to_sites, apply_with_prob, measure_site, reset_site};
use romps::basis::BoundaryCondition;
use romps::geometry::Geometry;
use romps::operations::{basis_projector, Gate, MeasurementBasis};
use romps::rng::{RngRegistry, StreamName};
use romps::state::{InitSpec, ProductStatePattern, SimulationState};
use romps::{Outcome, RompsError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

fn qubit_state(length: usize, bc: BoundaryCondition, pattern: u64) -> SimulationState {
    let mut state = SimulationState::new(length, bc).unwrap();
    state
        .initialize(InitSpec::ProductState(ProductStatePattern::BinaryInt(
            pattern,
        )))
        .unwrap();
    state
}

/// Probability of finding `site` in local state 1.
fn occupation(state: &SimulationState, site: usize) -> f64 {
    let ram = state.basis().ram(site);
    let projector = basis_projector(1, state.local_dim()).unwrap();
    state.mps().unwrap().born_probability(ram, &projector).unwrap()
}

#[test]
fn product_state_initialization_has_bond_dimension_one() {
    let state = qubit_state(4, BoundaryCondition::Open, 5);
    assert_eq!(state.mps().unwrap().max_bond_dim(), 1);
    // binary_int = 5 places bits 0101 with the most significant bit at site 1.
    assert!(occupation(&state, 1) < 1e-12);
    assert!((occupation(&state, 2) - 1.0).abs() < 1e-12);
    assert!(occupation(&state, 3) < 1e-12);
    assert!((occupation(&state, 4) - 1.0).abs() < 1e-12);
}

#[test]
fn pauli_x_flips_a_site() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    apply(
        &mut state,
        &Gate::PauliX,
        &mut Geometry::single_site(3),
    )
    .unwrap();
    assert!((occupation(&state, 3) - 1.0).abs() < 1e-12);
    assert!(occupation(&state, 1) < 1e-12);
}

#[test]
fn unitary_gates_preserve_the_norm_without_renormalization() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    apply(
        &mut state,
        &Gate::HaarRandom,
        &mut Geometry::adjacent_pair(2),
    )
    .unwrap();
    apply(&mut state, &Gate::CZ, &mut Geometry::adjacent_pair(1)).unwrap();
    let norm = state.mps().unwrap().norm();
    assert!((norm - 1.0).abs() < 1e-10);
}

#[test]
fn projection_renormalizes_the_state() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    apply(
        &mut state,
        &Gate::HaarRandom,
        &mut Geometry::adjacent_pair(1),
    )
    .unwrap();
    apply(
        &mut state,
        &Gate::Projection { outcome: 0 },
        &mut Geometry::single_site(1),
    )
    .unwrap();
    assert!((state.mps().unwrap().norm() - 1.0).abs() < 1e-10);
    assert!(occupation(&state, 1) < 1e-12);
}

#[test]
fn projecting_onto_an_empty_branch_fails_numerically() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    // Site 1 is in |0>; projecting it onto |1> leaves nothing to normalize.
    let result = apply(
        &mut state,
        &Gate::Projection { outcome: 1 },
        &mut Geometry::single_site(1),
    );
    assert!(matches!(result, Err(RompsError::NumericalFailure { .. })));
}

#[test]
fn measurement_of_a_basis_state_is_deterministic() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0b0100);
    assert_eq!(measure_site(&mut state, 1, MeasurementBasis::Z).unwrap(), 0);
    assert_eq!(measure_site(&mut state, 2, MeasurementBasis::Z).unwrap(), 1);
    // The post-measurement state is unchanged up to normalization.
    assert!((occupation(&state, 2) - 1.0).abs() < 1e-12);
}

#[test]
fn reset_flips_a_one_back_to_zero() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0b1111);
    for site in 1..=4 {
        let outcome = reset_site(&mut state, site).unwrap();
        assert_eq!(outcome, 1);
    }
    for site in 1..=4 {
        assert!(occupation(&state, site) < 1e-12);
    }
}

#[test]
fn composite_gates_reject_raw_pair_site_lists() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    let result = apply_to_sites(&mut state, &Gate::Reset, &[1, 2]);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn support_mismatch_is_rejected() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    assert!(apply_to_sites(&mut state, &Gate::CZ, &[1]).is_err());
    assert!(apply_to_sites(&mut state, &Gate::PauliX, &[1, 2]).is_err());
    assert!(apply_to_sites(&mut state, &Gate::CZ, &[2, 2]).is_err());
}

#[test]
fn gates_on_uninitialized_states_are_rejected() {
    let mut state = SimulationState::new(4, BoundaryCondition::Open).unwrap();
    let result = apply_to_sites(&mut state, &Gate::PauliX, &[1]);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn periodic_wrap_pairs_work_through_the_folded_mapping() {
    let mut state = qubit_state(6, BoundaryCondition::Periodic, 0b000001);
    // The wrap pair (6, 1) is RAM-adjacent under the folded mapping.
    apply(&mut state, &Gate::CZ, &mut Geometry::adjacent_pair(6)).unwrap();
    assert!((state.mps().unwrap().norm() - 1.0).abs() < 1e-10);
    // Site labels still address the right physical sites after translation.
    assert!((occupation(&state, 6) - 1.0).abs() < 1e-12);
    assert!(occupation(&state, 5) < 1e-12);
}

#[test]
fn staircase_advances_once_per_application() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    let mut geometry = Geometry::staircase_right(1);
    apply(&mut state, &Gate::HaarRandom, &mut geometry).unwrap();
    assert_eq!(geometry.sites(4, BoundaryCondition::Open).unwrap(), vec![2, 3]);
    apply(&mut state, &Gate::HaarRandom, &mut geometry).unwrap();
    assert_eq!(geometry.sites(4, BoundaryCondition::Open).unwrap(), vec![3, 4]);
}

#[test]
fn pointer_stays_put_when_applied() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    let mut geometry = Geometry::pointer(2);
    apply(&mut state, &Gate::CZ, &mut geometry).unwrap();
    assert_eq!(geometry.sites(4, BoundaryCondition::Open).unwrap(), vec![2, 3]);
}

#[test]
fn apply_with_prob_consumes_exactly_one_ctrl_draw() {
    let mut seeds = HashMap::new();
    seeds.insert(StreamName::Ctrl, 99_u64);
    let mut state = SimulationState::new(4, BoundaryCondition::Open)
        .unwrap()
        .with_rng(RngRegistry::with_stream_seeds(&seeds));
    state
        .initialize(InitSpec::ProductState(ProductStatePattern::BinaryInt(0)))
        .unwrap();
    let mut reference = StdRng::seed_from_u64(99);
    let _first_draw = reference.random::<f64>();
    let second_draw = reference.random::<f64>();
    let third_draw = reference.random::<f64>();

    // A branch that can never fire still consumes exactly one draw.
    let mut dead = [Outcome::new(0.0, Gate::PauliX, Geometry::single_site(1))];
    let selected = apply_with_prob(&mut state, StreamName::Ctrl, &mut dead).unwrap();
    assert_eq!(selected, None);
    assert_eq!(state.rng_mut().draw(StreamName::Ctrl), second_draw);

    // A certain branch fires and also consumes exactly one draw.
    let mut certain = [Outcome::new(1.0, Gate::PauliX, Geometry::single_site(1))];
    let selected = apply_with_prob(&mut state, StreamName::Ctrl, &mut certain).unwrap();
    assert_eq!(selected, Some(0));
    assert!((occupation(&state, 1) - 1.0).abs() < 1e-12);
    // The verification draw above advanced the stream once, so the second selection
    // consumed the third draw and the stream now sits before the fourth.
    let _ = third_draw;
    assert_eq!(
        state.rng_mut().draw(StreamName::Ctrl),
        reference.random::<f64>()
    );
}

#[test]
fn apply_with_prob_validates_before_drawing() {
    let mut state = qubit_state(4, BoundaryCondition::Open, 0);
    let result = apply_with_prob(&mut state, StreamName::Ctrl, &mut []);
    assert!(matches!(result, Err(RompsError::InvalidArgument { .. })));
}

#[test]
fn truncation_respects_the_configured_maxdim() {
    let mut state = SimulationState::new(8, BoundaryCondition::Open)
        .unwrap()
        .with_maxdim(2);
    state
        .initialize(InitSpec::ProductState(ProductStatePattern::BinaryInt(0)))
        .unwrap();
    // A few layers of entanglers would exceed bond dimension 2 without truncation.
    for _ in 0..4 {
        let mut layer = Geometry::bricklayer(romps::geometry::Parity::Nn);
        apply(&mut state, &Gate::HaarRandom, &mut layer).unwrap();
    }
    assert!(state.mps().unwrap().max_bond_dim() <= 2);
}
