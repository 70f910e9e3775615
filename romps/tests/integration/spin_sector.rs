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

//! Integration test for the spin-1 sector projectors and the AKLT sanity scenario.

use ndarray::Array2;
use num_complex::Complex64;
use romps::apply::apply;
use romps::basis::BoundaryCondition;
use romps::geometry::{Geometry, Parity};
use romps::observables::Observable;
use romps::operations::{spin_sector_projector, spin_sector_projector_sum, Gate};
use romps::state::{InitSpec, SimulationState, SiteType};
use romps::RompsError;
use test_case::test_case;

fn matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tolerance: f64) -> bool {
    a.shape() == b.shape()
        && a.iter()
            .zip(b.iter())
            .all(|(left, right)| (left - right).norm() < tolerance)
}

fn trace(matrix: &Array2<Complex64>) -> Complex64 {
    (0..matrix.nrows()).map(|index| matrix[[index, index]]).sum()
}

#[test_case(0, 1.0; "singlet sector")]
#[test_case(1, 3.0; "triplet sector")]
#[test_case(2, 5.0; "quintet sector")]
fn projector_traces_match_the_sector_dimension(sector: usize, expected: f64) {
    let projector = spin_sector_projector(sector).unwrap();
    let value = trace(&projector);
    assert!((value.re - expected).abs() < 1e-10);
    assert!(value.im.abs() < 1e-12);
}

#[test]
fn projectors_are_complete() {
    let sum = spin_sector_projector_sum(&[0, 1, 2]).unwrap();
    let identity = Array2::<Complex64>::eye(9);
    assert!(matrix_close(&sum, &identity, 1e-10));
}

#[test_case(0; "singlet")]
#[test_case(1; "triplet")]
#[test_case(2; "quintet")]
fn projectors_are_idempotent(sector: usize) {
    let projector = spin_sector_projector(sector).unwrap();
    let squared = projector.dot(&projector);
    assert!(matrix_close(&squared, &projector, 1e-10));
}

#[test]
fn projectors_are_mutually_orthogonal() {
    for a in 0..3_usize {
        for b in 0..3_usize {
            if a == b {
                continue;
            }
            let product = spin_sector_projector(a)
                .unwrap()
                .dot(&spin_sector_projector(b).unwrap());
            let zero = Array2::<Complex64>::zeros((9, 9));
            assert!(matrix_close(&product, &zero, 1e-10));
        }
    }
}

#[test]
fn unknown_sectors_are_rejected() {
    assert!(matches!(
        spin_sector_projector(3),
        Err(RompsError::InvalidArgument { .. })
    ));
    assert!(spin_sector_projector_sum(&[]).is_err());
    assert!(spin_sector_projector_sum(&[0, 0]).is_err());
}

fn spin_one_chain(length: usize) -> SimulationState {
    let mut state = SimulationState::new(length, BoundaryCondition::Open)
        .unwrap()
        .with_site_type(SiteType::SpinOne);
    // All sites in |m = 0>.
    state
        .initialize(InitSpec::StateIndices(vec![1; length]))
        .unwrap();
    state
}

#[test]
fn complete_sector_projection_acts_as_the_identity() {
    let mut state = spin_one_chain(4);
    apply(
        &mut state,
        &Gate::SpinSectorProjection {
            sectors: vec![0, 1, 2],
        },
        &mut Geometry::adjacent_pair(2),
    )
    .unwrap();
    assert!((state.mps().unwrap().norm() - 1.0).abs() < 1e-10);
    // The state is still the all-|m=0> product state: no entanglement anywhere.
    for bond in 1..4 {
        assert!(state.mps().unwrap().entanglement_entropy(bond).unwrap() < 1e-8);
    }
}

#[test]
fn measuring_an_absent_sector_fails_numerically() {
    let mut state = spin_one_chain(4);
    // |m=0, m=0> has no weight in the triplet sector.
    let result = apply(
        &mut state,
        &Gate::SpinSectorMeasurement { sectors: vec![1] },
        &mut Geometry::adjacent_pair(1),
    );
    assert!(matches!(result, Err(RompsError::NumericalFailure { .. })));
}

#[test]
fn sector_measurement_projects_into_the_sampled_sector() {
    let mut state = spin_one_chain(4);
    apply(
        &mut state,
        &Gate::SpinSectorMeasurement {
            sectors: vec![0, 1, 2],
        },
        &mut Geometry::adjacent_pair(1),
    )
    .unwrap();
    assert!((state.mps().unwrap().norm() - 1.0).abs() < 1e-10);
}

#[test]
fn aklt_projection_reproduces_the_string_order_magnitude() {
    let length = 6;
    let mut state = spin_one_chain(length);
    state
        .track(
            "string",
            Observable::StringOrder {
                i1: 1,
                i2: length / 2 + 1,
                order: 1,
            },
        )
        .unwrap();
    // Repeated projection onto the spin-0 and spin-1 sectors of every
    // nearest-neighbour pair converges onto the AKLT ground space.
    let gate = Gate::SpinSectorProjection {
        sectors: vec![0, 1],
    };
    for _ in 0..length {
        let mut layer = Geometry::bricklayer(Parity::Nn);
        apply(&mut state, &gate, &mut layer).unwrap();
    }
    state.record(None).unwrap();
    let value = state.series("string").unwrap()[0];
    let magnitude = value.abs();
    let expected = 4.0 / 9.0;
    assert!(
        (magnitude - expected).abs() < 0.05 * expected,
        "string order magnitude {magnitude} deviates from {expected}"
    );
}
