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

//! Integration test for the public API of the geometry layer.

use romps::basis::BoundaryCondition;
use romps::geometry::{Direction, Geometry, Parity};
use romps::RompsError;
use test_case::test_case;

const OPEN: BoundaryCondition = BoundaryCondition::Open;
const PERIODIC: BoundaryCondition = BoundaryCondition::Periodic;

#[test]
fn single_site_returns_its_site() {
    let geometry = Geometry::single_site(3);
    assert_eq!(geometry.sites(6, OPEN).unwrap(), vec![3]);
}

#[test]
fn adjacent_pair_wraps_under_periodic_only() {
    assert_eq!(
        Geometry::adjacent_pair(6).sites(6, PERIODIC).unwrap(),
        vec![6, 1]
    );
    assert!(matches!(
        Geometry::adjacent_pair(6).sites(6, OPEN),
        Err(RompsError::InvalidArgument { .. })
    ));
    assert_eq!(
        Geometry::adjacent_pair(2).sites(6, OPEN).unwrap(),
        vec![2, 3]
    );
}

#[test]
fn next_nearest_neighbor_wraps_both_edge_pairs() {
    assert_eq!(
        Geometry::next_nearest_neighbor(5).sites(6, PERIODIC).unwrap(),
        vec![5, 1]
    );
    assert_eq!(
        Geometry::next_nearest_neighbor(6).sites(6, PERIODIC).unwrap(),
        vec![6, 2]
    );
    assert!(Geometry::next_nearest_neighbor(5).sites(6, OPEN).is_err());
}

#[test]
fn staircase_right_advances_and_cycles_open() {
    let mut geometry = Geometry::staircase_right(4);
    // Open boundary conditions cycle the position over 1..=L-1.
    assert_eq!(geometry.sites(5, OPEN).unwrap(), vec![4, 5]);
    geometry.advance(5, OPEN);
    assert_eq!(geometry.sites(5, OPEN).unwrap(), vec![1, 2]);
    geometry.advance(5, OPEN);
    assert_eq!(geometry.sites(5, OPEN).unwrap(), vec![2, 3]);
}

#[test]
fn staircase_right_cycles_over_full_chain_periodic() {
    let mut geometry = Geometry::staircase_right(6);
    assert_eq!(geometry.sites(6, PERIODIC).unwrap(), vec![6, 1]);
    geometry.advance(6, PERIODIC);
    assert_eq!(geometry.sites(6, PERIODIC).unwrap(), vec![1, 2]);
}

#[test]
fn staircase_left_decrements_with_wrap() {
    let mut geometry = Geometry::staircase_left(1);
    assert_eq!(geometry.sites(6, PERIODIC).unwrap(), vec![1, 2]);
    geometry.advance(6, PERIODIC);
    assert_eq!(geometry.sites(6, PERIODIC).unwrap(), vec![6, 1]);
    geometry.advance(6, PERIODIC);
    assert_eq!(geometry.sites(6, PERIODIC).unwrap(), vec![5, 6]);
}

#[test]
fn pointer_never_advances_on_its_own() {
    let mut geometry = Geometry::pointer(2);
    assert_eq!(geometry.sites(6, OPEN).unwrap(), vec![2, 3]);
    geometry.advance(6, OPEN);
    assert_eq!(geometry.sites(6, OPEN).unwrap(), vec![2, 3]);
    geometry.move_pointer(Direction::Right, 6, OPEN).unwrap();
    assert_eq!(geometry.sites(6, OPEN).unwrap(), vec![3, 4]);
    geometry.move_pointer(Direction::Left, 6, OPEN).unwrap();
    geometry.move_pointer(Direction::Left, 6, OPEN).unwrap();
    assert_eq!(geometry.sites(6, OPEN).unwrap(), vec![1, 2]);
}

#[test]
fn move_pointer_rejects_other_geometries() {
    let mut geometry = Geometry::single_site(1);
    assert!(geometry.move_pointer(Direction::Right, 6, OPEN).is_err());
}

#[test]
fn bricklayer_odd_and_even_cover_the_chain() {
    let odd = Geometry::bricklayer(Parity::Odd).elements(6, OPEN).unwrap();
    assert_eq!(odd, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
    let even_open = Geometry::bricklayer(Parity::Even).elements(6, OPEN).unwrap();
    assert_eq!(even_open, vec![vec![2, 3], vec![4, 5]]);
    let even_periodic = Geometry::bricklayer(Parity::Even)
        .elements(6, PERIODIC)
        .unwrap();
    assert_eq!(even_periodic, vec![vec![2, 3], vec![4, 5], vec![6, 1]]);
}

#[test]
fn bricklayer_nn_is_odd_then_even() {
    let nn = Geometry::bricklayer(Parity::Nn).elements(4, PERIODIC).unwrap();
    assert_eq!(nn, vec![vec![1, 2], vec![3, 4], vec![2, 3], vec![4, 1]]);
}

#[test_case(Parity::NnnOdd1, vec![vec![1, 3], vec![5, 7]]; "odd one")]
#[test_case(Parity::NnnOdd2, vec![vec![3, 5], vec![7, 1]]; "odd two")]
#[test_case(Parity::NnnEven1, vec![vec![2, 4], vec![6, 8]]; "even one")]
#[test_case(Parity::NnnEven2, vec![vec![4, 6], vec![8, 2]]; "even two")]
fn bricklayer_nnn_parities_partition_distance_two_pairs(
    parity: Parity,
    expected: Vec<Vec<usize>>,
) {
    let pairs = Geometry::bricklayer(parity).elements(8, PERIODIC).unwrap();
    assert_eq!(pairs, expected);
}

#[test]
fn bricklayer_nnn_skips_wrap_pairs_when_open() {
    let pairs = Geometry::bricklayer(Parity::NnnOdd2).elements(8, OPEN).unwrap();
    assert_eq!(pairs, vec![vec![3, 5]]);
    let union = Geometry::bricklayer(Parity::Nnn).elements(8, PERIODIC).unwrap();
    assert_eq!(union.len(), 8);
}

#[test]
fn all_sites_enumerates_every_site() {
    let elements = Geometry::AllSites.elements(4, OPEN).unwrap();
    assert_eq!(elements, vec![vec![1], vec![2], vec![3], vec![4]]);
}

#[test]
fn compute_sites_tracks_staircase_steps_without_mutation() {
    let geometry = Geometry::staircase_right(1);
    assert_eq!(geometry.compute_sites(1, 4, OPEN).unwrap(), vec![1, 2]);
    assert_eq!(geometry.compute_sites(2, 4, OPEN).unwrap(), vec![2, 3]);
    assert_eq!(geometry.compute_sites(3, 4, OPEN).unwrap(), vec![3, 4]);
    // Open boundary conditions cycle over 1..=L-1.
    assert_eq!(geometry.compute_sites(4, 4, OPEN).unwrap(), vec![1, 2]);
    // The geometry itself is untouched.
    assert_eq!(geometry.sites(4, OPEN).unwrap(), vec![1, 2]);
}

#[test]
fn compute_sites_matches_advance_sequence() {
    let pure = Geometry::staircase_left(3);
    let mut walked = Geometry::staircase_left(3);
    for step in 1..=10 {
        assert_eq!(
            pure.compute_sites(step, 6, PERIODIC).unwrap(),
            walked.sites(6, PERIODIC).unwrap(),
            "diverged at step {step}"
        );
        walked.advance(6, PERIODIC);
    }
}

#[test]
fn out_of_range_positions_are_rejected() {
    assert!(Geometry::single_site(0).sites(4, OPEN).is_err());
    assert!(Geometry::single_site(5).sites(4, OPEN).is_err());
    assert!(Geometry::staircase_right(9).sites(4, PERIODIC).is_err());
}
