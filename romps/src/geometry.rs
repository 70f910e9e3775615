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

//! Geometries mapping abstract gate patterns to physical sites.
//!
//! A geometry answers the question "which sites does the next application of this gate
//! act on". Static geometries ([Geometry::SingleSite], [Geometry::AdjacentPair],
//! [Geometry::NextNearestNeighbor]) always produce the same sites. Staircases and
//! pointers carry a mutable position; staircases advance by one site after every
//! application, pointers move only on request. Compound geometries
//! ([Geometry::Bricklayer], [Geometry::AllSites]) expand into an ordered list of
//! elements that are applied one after another.
//!
//! All site lists use physical 1-based labels; translation to RAM positions happens in
//! the apply engine.

use crate::basis::BoundaryCondition;
use crate::RompsError;

/// Direction for moving a [Geometry::Pointer].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Move the pointer one site towards site 1.
    Left,
    /// Move the pointer one site towards site L.
    Right,
}

/// Parity selecting the pair set of a [Geometry::Bricklayer].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    /// Nearest-neighbour pairs starting at odd sites: (1,2), (3,4), ...
    Odd,
    /// Nearest-neighbour pairs starting at even sites: (2,3), (4,5), ...; adds the wrap
    /// pair (L,1) under periodic boundary conditions.
    Even,
    /// Union of [Parity::Odd] and [Parity::Even], in that order.
    Nn,
    /// Next-nearest-neighbour pairs (i, i+2) with i ≡ 1 (mod 4).
    NnnOdd1,
    /// Next-nearest-neighbour pairs (i, i+2) with i ≡ 3 (mod 4).
    NnnOdd2,
    /// Next-nearest-neighbour pairs (i, i+2) with i ≡ 2 (mod 4).
    NnnEven1,
    /// Next-nearest-neighbour pairs (i, i+2) with i ≡ 0 (mod 4).
    NnnEven2,
    /// Union of the four NNN sub-parities, in declaration order.
    Nnn,
}

/// Placement pattern for gate applications on the chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Geometry {
    /// A single fixed site.
    SingleSite {
        /// The physical site the gate acts on.
        site: usize,
    },
    /// The pair (i, i+1), wrapping to (L, 1) under periodic boundary conditions.
    AdjacentPair {
        /// The left physical site of the pair.
        site: usize,
    },
    /// The pair (i, i+2), wrapping to (L-1, 1) and (L, 2) under periodic boundary
    /// conditions.
    NextNearestNeighbor {
        /// The left physical site of the pair.
        site: usize,
    },
    /// All pairs of the given parity, applied element by element.
    Bricklayer {
        /// The parity selecting the pair set.
        parity: Parity,
    },
    /// Every site of the chain, one single-site application each.
    AllSites,
    /// A moving pair that walks leftwards by one site after every application.
    StaircaseLeft {
        /// Current left position of the pair.
        position: usize,
        /// Distance between the two sites of the pair.
        stride: usize,
    },
    /// A moving pair that walks rightwards by one site after every application.
    StaircaseRight {
        /// Current left position of the pair.
        position: usize,
        /// Distance between the two sites of the pair.
        stride: usize,
    },
    /// Like [Geometry::StaircaseRight] with stride one, but never advances on its own;
    /// [Geometry::move_pointer] is the only mutation.
    Pointer {
        /// Current left position of the pair.
        position: usize,
    },
}

/// Wraps a 1-based site into 1..=length.
fn wrap_site(site: i64, length: usize) -> usize {
    ((site - 1).rem_euclid(length as i64) + 1) as usize
}

impl Geometry {
    /// Creates a [Geometry::SingleSite].
    pub fn single_site(site: usize) -> Self {
        Geometry::SingleSite { site }
    }

    /// Creates a [Geometry::AdjacentPair] with left site `site`.
    pub fn adjacent_pair(site: usize) -> Self {
        Geometry::AdjacentPair { site }
    }

    /// Creates a [Geometry::NextNearestNeighbor] with left site `site`.
    pub fn next_nearest_neighbor(site: usize) -> Self {
        Geometry::NextNearestNeighbor { site }
    }

    /// Creates a [Geometry::Bricklayer] over the given parity.
    pub fn bricklayer(parity: Parity) -> Self {
        Geometry::Bricklayer { parity }
    }

    /// Creates a [Geometry::StaircaseRight] starting at `start` with stride one.
    pub fn staircase_right(start: usize) -> Self {
        Geometry::StaircaseRight {
            position: start,
            stride: 1,
        }
    }

    /// Creates a [Geometry::StaircaseLeft] starting at `start` with stride one.
    pub fn staircase_left(start: usize) -> Self {
        Geometry::StaircaseLeft {
            position: start,
            stride: 1,
        }
    }

    /// Creates a [Geometry::Pointer] starting at `start`.
    pub fn pointer(start: usize) -> Self {
        Geometry::Pointer { position: start }
    }

    /// Returns true for geometries that expand into multiple gate applications.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Geometry::Bricklayer { .. } | Geometry::AllSites
        )
    }

    /// Computes the physical sites of the next application of a non-compound geometry.
    ///
    /// Reads but does not change mutable positions; advancing a staircase is a separate
    /// step performed by the apply engine after the gate has been applied.
    ///
    /// # Arguments
    ///
    /// * `length` - The chain length L.
    /// * `bc` - The boundary condition deciding the wrap rules.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<usize>)` - The physical sites, in application order.
    /// * `Err(RompsError)` - The geometry runs out of the chain under open boundary
    ///   conditions, or a compound geometry was passed.
    pub fn sites(&self, length: usize, bc: BoundaryCondition) -> Result<Vec<usize>, RompsError> {
        match self {
            Geometry::SingleSite { site } => {
                check_site(*site, length)?;
                Ok(vec![*site])
            }
            Geometry::AdjacentPair { site } => {
                check_site(*site, length)?;
                pair_sites(*site, 1, length, bc)
            }
            Geometry::NextNearestNeighbor { site } => {
                check_site(*site, length)?;
                pair_sites(*site, 2, length, bc)
            }
            Geometry::StaircaseRight { position, stride }
            | Geometry::StaircaseLeft { position, stride } => {
                check_site(*position, length)?;
                pair_sites(*position, *stride, length, bc)
            }
            Geometry::Pointer { position } => {
                check_site(*position, length)?;
                pair_sites(*position, 1, length, bc)
            }
            Geometry::Bricklayer { .. } | Geometry::AllSites => Err(RompsError::internal(
                "compound geometry has no single site list; expand its elements instead",
            )),
        }
    }

    /// Enumerates the elements of a compound geometry, each a list of physical sites.
    ///
    /// # Arguments
    ///
    /// * `length` - The chain length L.
    /// * `bc` - The boundary condition deciding which wrap pairs are included.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Vec<usize>>)` - The ordered element list.
    /// * `Err(RompsError)` - A non-compound geometry was passed.
    pub fn elements(
        &self,
        length: usize,
        bc: BoundaryCondition,
    ) -> Result<Vec<Vec<usize>>, RompsError> {
        match self {
            Geometry::AllSites => Ok((1..=length).map(|site| vec![site]).collect()),
            Geometry::Bricklayer { parity } => Ok(bricklayer_pairs(*parity, length, bc)),
            _ => Err(RompsError::internal(
                "elements requested for a non-compound geometry",
            )),
        }
    }

    /// Advances a staircase position by one site after an application.
    ///
    /// Rightward staircases increment, leftward staircases decrement. The position
    /// cycles over 1..=L under periodic boundary conditions and over 1..=L-1 under open
    /// boundary conditions, so the pair never leaves the chain. Geometries without
    /// automatic advancement are left untouched.
    ///
    /// # Arguments
    ///
    /// * `length` - The chain length L.
    /// * `bc` - The boundary condition deciding the cycle range.
    pub fn advance(&mut self, length: usize, bc: BoundaryCondition) {
        let cycle = match bc {
            BoundaryCondition::Open => length - 1,
            BoundaryCondition::Periodic | BoundaryCondition::PeriodicNnn => length,
        };
        match self {
            Geometry::StaircaseRight { position, .. } => {
                *position = wrap_site(*position as i64 + 1, cycle);
            }
            Geometry::StaircaseLeft { position, .. } => {
                *position = wrap_site(*position as i64 - 1, cycle);
            }
            _ => {}
        }
    }

    /// Moves a [Geometry::Pointer] one site in the given direction.
    ///
    /// The position cycles over the same range as a staircase. Calling this on any
    /// other geometry is an error.
    ///
    /// # Arguments
    ///
    /// * `direction` - Which way to move.
    /// * `length` - The chain length L.
    /// * `bc` - The boundary condition deciding the cycle range.
    pub fn move_pointer(
        &mut self,
        direction: Direction,
        length: usize,
        bc: BoundaryCondition,
    ) -> Result<(), RompsError> {
        let cycle = match bc {
            BoundaryCondition::Open => length - 1,
            BoundaryCondition::Periodic | BoundaryCondition::PeriodicNnn => length,
        };
        match self {
            Geometry::Pointer { position } => {
                let shift = match direction {
                    Direction::Left => -1,
                    Direction::Right => 1,
                };
                *position = wrap_site(*position as i64 + shift, cycle);
                Ok(())
            }
            _ => Err(RompsError::invalid_argument(
                "move_pointer is only defined for Pointer geometries",
            )),
        }
    }

    /// Pure variant of [Geometry::sites] used by symbolic expansion.
    ///
    /// Staircases are evaluated as if they had advanced `step - 1` times from their
    /// recorded starting position; every other geometry is position-independent. Never
    /// mutates the geometry, so expanding a circuit leaves its pointers untouched.
    ///
    /// # Arguments
    ///
    /// * `step` - The 1-based step index of the expansion.
    /// * `length` - The chain length L.
    /// * `bc` - The boundary condition deciding wrap rules.
    pub fn compute_sites(
        &self,
        step: usize,
        length: usize,
        bc: BoundaryCondition,
    ) -> Result<Vec<usize>, RompsError> {
        let cycle = match bc {
            BoundaryCondition::Open => length - 1,
            BoundaryCondition::Periodic | BoundaryCondition::PeriodicNnn => length,
        };
        let advances = (step - 1) as i64;
        match self {
            Geometry::StaircaseRight { position, stride } => {
                check_site(*position, length)?;
                check_cycle_start(*position, cycle)?;
                let current = wrap_site(*position as i64 + advances, cycle);
                pair_sites(current, *stride, length, bc)
            }
            Geometry::StaircaseLeft { position, stride } => {
                check_site(*position, length)?;
                check_cycle_start(*position, cycle)?;
                let current = wrap_site(*position as i64 - advances, cycle);
                pair_sites(current, *stride, length, bc)
            }
            _ => self.sites(length, bc),
        }
    }
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Geometry::SingleSite { site } => write!(f, "SingleSite({site})"),
            Geometry::AdjacentPair { site } => write!(f, "AdjacentPair({site})"),
            Geometry::NextNearestNeighbor { site } => write!(f, "NextNearestNeighbor({site})"),
            Geometry::Bricklayer { parity } => write!(f, "Bricklayer({parity:?})"),
            Geometry::AllSites => write!(f, "AllSites"),
            Geometry::StaircaseLeft { position, stride } => {
                write!(f, "StaircaseLeft({position}, stride {stride})")
            }
            Geometry::StaircaseRight { position, stride } => {
                write!(f, "StaircaseRight({position}, stride {stride})")
            }
            Geometry::Pointer { position } => write!(f, "Pointer({position})"),
        }
    }
}

/// A staircase start must lie inside the cycle it will walk over.
fn check_cycle_start(position: usize, cycle: usize) -> Result<(), RompsError> {
    if position > cycle {
        return Err(RompsError::invalid_argument(format!(
            "staircase start {position} is outside its cycle 1..={cycle}"
        )));
    }
    Ok(())
}

fn check_site(site: usize, length: usize) -> Result<(), RompsError> {
    if site == 0 || site > length {
        return Err(RompsError::invalid_argument(format!(
            "site {site} is outside the chain 1..={length}"
        )));
    }
    Ok(())
}

/// Builds the pair `[site, site + offset]`, wrapping under periodic boundary conditions.
fn pair_sites(
    site: usize,
    offset: usize,
    length: usize,
    bc: BoundaryCondition,
) -> Result<Vec<usize>, RompsError> {
    let partner = site + offset;
    match bc {
        BoundaryCondition::Open => {
            if partner > length {
                Err(RompsError::invalid_argument(format!(
                    "pair ({site}, {partner}) leaves the open chain of length {length}"
                )))
            } else {
                Ok(vec![site, partner])
            }
        }
        BoundaryCondition::Periodic | BoundaryCondition::PeriodicNnn => {
            Ok(vec![site, wrap_site(partner as i64, length)])
        }
    }
}

/// Enumerates the bricklayer pairs of one parity.
fn bricklayer_pairs(parity: Parity, length: usize, bc: BoundaryCondition) -> Vec<Vec<usize>> {
    let periodic = !matches!(bc, BoundaryCondition::Open);
    match parity {
        Parity::Odd => (1..=length)
            .step_by(2)
            .filter(|site| site + 1 <= length)
            .map(|site| vec![site, site + 1])
            .collect(),
        Parity::Even => {
            let mut pairs: Vec<Vec<usize>> = (2..=length)
                .step_by(2)
                .filter(|site| site + 1 <= length)
                .map(|site| vec![site, site + 1])
                .collect();
            if periodic && length >= 2 {
                pairs.push(vec![length, 1]);
            }
            pairs
        }
        Parity::Nn => {
            let mut pairs = bricklayer_pairs(Parity::Odd, length, bc);
            pairs.extend(bricklayer_pairs(Parity::Even, length, bc));
            pairs
        }
        Parity::NnnOdd1 => nnn_pairs(1, length, periodic),
        Parity::NnnOdd2 => nnn_pairs(3, length, periodic),
        Parity::NnnEven1 => nnn_pairs(2, length, periodic),
        Parity::NnnEven2 => nnn_pairs(0, length, periodic),
        Parity::Nnn => {
            let mut pairs = nnn_pairs(1, length, periodic);
            pairs.extend(nnn_pairs(3, length, periodic));
            pairs.extend(nnn_pairs(2, length, periodic));
            pairs.extend(nnn_pairs(0, length, periodic));
            pairs
        }
    }
}

/// Distance-2 pairs whose left site has the given residue modulo 4.
///
/// Under periodic boundary conditions the wrap pairs (L-1, 1) and (L, 2) are included
/// when their left site matches the residue; under open boundary conditions pairs
/// leaving the chain are skipped.
fn nnn_pairs(residue: usize, length: usize, periodic: bool) -> Vec<Vec<usize>> {
    (1..=length)
        .filter(|site| site % 4 == residue)
        .filter_map(|site| {
            if site + 2 <= length {
                Some(vec![site, site + 2])
            } else if periodic {
                Some(vec![site, wrap_site((site + 2) as i64, length)])
            } else {
                None
            }
        })
        .collect()
}
