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

//! Basis mappings between physical sites and RAM positions.
//!
//! Physical sites carry the user-facing labels 1..=L. RAM positions give the order in
//! which the sites appear along the MPS chain. For open boundary conditions the two
//! coincide. For periodic boundary conditions the chain is folded so that physically
//! neighbouring sites stay close in RAM, which keeps two-site gates cheap after the wrap.

use crate::RompsError;

/// Boundary condition of the simulated chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryCondition {
    /// Open chain, identity basis mapping.
    Open,
    /// Periodic chain, folded basis mapping `[1, L, 2, L-1, ...]`.
    Periodic,
    /// Periodic chain with an outward-from-middle mapping suited to
    /// next-nearest-neighbour gates.
    PeriodicNnn,
}

impl std::fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryCondition::Open => write!(f, "open"),
            BoundaryCondition::Periodic => write!(f, "periodic"),
            BoundaryCondition::PeriodicNnn => write!(f, "periodic_nnn"),
        }
    }
}

/// Bidirectional mapping between physical sites and RAM positions.
///
/// Both directions are stored as 1-based permutations of 1..=L. The mapping is fixed at
/// construction time and guaranteed to satisfy `phy_to_ram[ram_to_phy[k]] = k`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BasisMap {
    /// Number of sites in the chain.
    length: usize,
    /// Maps physical site (1-based) to RAM position (1-based). Index 0 is unused.
    phy_to_ram: Vec<usize>,
    /// Maps RAM position (1-based) to physical site (1-based). Index 0 is unused.
    ram_to_phy: Vec<usize>,
}

impl BasisMap {
    /// Creates the basis mapping for a chain of `length` sites under the given boundary
    /// condition.
    ///
    /// # Arguments
    ///
    /// * `length` - The number of physical sites, at least 2.
    /// * `bc` - The boundary condition selecting the mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(BasisMap)` - The constructed mapping.
    /// * `Err(RompsError)` - `length` is below 2, or a periodic mapping was requested
    ///   with odd `length`.
    pub fn new(length: usize, bc: BoundaryCondition) -> Result<Self, RompsError> {
        if length < 2 {
            return Err(RompsError::invalid_argument(format!(
                "chain length must be at least 2, got {length}"
            )));
        }
        let ram_order = match bc {
            BoundaryCondition::Open => (1..=length).collect::<Vec<usize>>(),
            BoundaryCondition::Periodic => {
                if length % 2 != 0 {
                    return Err(RompsError::invalid_argument(format!(
                        "periodic boundary conditions require even length, got {length}"
                    )));
                }
                folded_order(length)
            }
            BoundaryCondition::PeriodicNnn => {
                if length % 2 != 0 {
                    return Err(RompsError::invalid_argument(format!(
                        "periodic_nnn boundary conditions require even length, got {length}"
                    )));
                }
                outward_from_middle_order(length)
            }
        };
        let mut phy_to_ram = vec![0_usize; length + 1];
        let mut ram_to_phy = vec![0_usize; length + 1];
        for (ram_index, phy) in ram_order.iter().enumerate() {
            ram_to_phy[ram_index + 1] = *phy;
            phy_to_ram[*phy] = ram_index + 1;
        }
        Ok(Self {
            length,
            phy_to_ram,
            ram_to_phy,
        })
    }

    /// Returns the number of sites in the chain.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the mapping covers no sites. Always false for constructed maps.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Translates a physical site (1-based) to its RAM position (1-based).
    ///
    /// # Panics
    ///
    /// Panics when `phy` is outside 1..=L; physical sites are validated at the API
    /// boundary before translation.
    pub fn ram(&self, phy: usize) -> usize {
        self.phy_to_ram[phy]
    }

    /// Translates a RAM position (1-based) to its physical site (1-based).
    ///
    /// # Panics
    ///
    /// Panics when `ram` is outside 1..=L.
    pub fn phy(&self, ram: usize) -> usize {
        self.ram_to_phy[ram]
    }

    /// Returns the physical site for every RAM position, in RAM order.
    pub fn sites_in_ram_order(&self) -> Vec<usize> {
        self.ram_to_phy[1..].to_vec()
    }

    /// Returns true when `phy` is a valid physical site of this chain.
    pub fn contains(&self, phy: usize) -> bool {
        (1..=self.length).contains(&phy)
    }
}

/// RAM order `[1, L, 2, L-1, 3, L-2, ...]`, interleaving the chain from both ends.
fn folded_order(length: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(length);
    let mut low = 1;
    let mut high = length;
    while low <= high {
        order.push(low);
        if high > low {
            order.push(high);
        }
        low += 1;
        high -= 1;
    }
    order
}

/// RAM order produced by the outward-from-middle permutation.
///
/// Starts at `left = L/2` and `right = L/2 + 1` and repeatedly appends `left`,
/// `left - 1`, then `right`, stepping `left` down by two and `right` up by one, until
/// both cursors have left 1..=L. Cursor values outside the range are skipped.
fn outward_from_middle_order(length: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(length);
    let mut left = (length / 2) as i64;
    let mut right = left + 1;
    let in_range = |site: i64| site >= 1 && site <= length as i64;
    while in_range(left) || in_range(left - 1) || in_range(right) {
        if in_range(left) {
            order.push(left as usize);
        }
        if in_range(left - 1) {
            order.push((left - 1) as usize);
        }
        if in_range(right) {
            order.push(right as usize);
        }
        left -= 2;
        right += 1;
    }
    order
}
