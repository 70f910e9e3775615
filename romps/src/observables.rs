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

//! Observables recorded during a simulation.
//!
//! Observables are registered by name on a [crate::state::SimulationState] and produce
//! one scalar per `record` call. Evaluation is read-only on the MPS apart from internal
//! gauged copies. Physical site indices are translated through the basis mapping before
//! they touch the chain.

use crate::basis::BoundaryCondition;
use crate::operations::{pauli_z, spin_one_string_phase, spin_one_sz};
use crate::state::{SimulationState, SiteType};
use crate::RompsError;
use ndarray::Array2;
use num_complex::Complex64;

/// Names of the observable kinds this crate implements.
pub fn list_observables() -> Vec<&'static str> {
    vec![
        "domain_wall",
        "entanglement_entropy",
        "string_order",
        "max_bond_dim",
    ]
}

/// An observable specification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Observable {
    /// Domain-wall density of a qubit chain.
    ///
    /// With a site index i (fixed at registration or supplied at record time) this is
    /// the local density `(1 - <Z_i Z_{i+1}>) / 2` at that bond; without one it is the
    /// sum over all nearest-neighbour bonds, including the wrap bond under periodic
    /// boundary conditions.
    DomainWall {
        /// Left site of the measured bond; `None` sums over the chain unless an index
        /// arrives at record time.
        i1: Option<usize>,
    },
    /// Von Neumann entanglement entropy across one cut of the MPS chain.
    EntanglementEntropy {
        /// The 1-based RAM bond of the cut; `None` uses the middle bond L/2.
        bond: Option<usize>,
    },
    /// String order `<O_i1 exp(i pi sum Sz) O_i2>` of a spin-1 chain.
    ///
    /// Order 1 uses a single Sz at each endpoint; order 2 uses the two-site blocks
    /// `Sz_i1 Sz_{i1+1}` and `Sz_{i2-1} Sz_{i2}` and needs enough separation for the
    /// blocks to stay disjoint.
    StringOrder {
        /// Left endpoint (physical site).
        i1: usize,
        /// Right endpoint (physical site).
        i2: usize,
        /// Endpoint order, 1 or 2.
        order: usize,
    },
    /// The largest bond dimension of the MPS; a truncation diagnostic.
    MaxBondDim,
}

impl Observable {
    /// Validates the observable against a state at registration time.
    pub(crate) fn validate(&self, state: &SimulationState) -> Result<(), RompsError> {
        match self {
            Observable::DomainWall { i1 } => {
                if state.local_dim() != 2 {
                    return Err(RompsError::unsupported(
                        "domain-wall observable is only defined for local dimension 2",
                    ));
                }
                if let Some(site) = i1 {
                    check_bond_site(*site, state)?;
                }
                Ok(())
            }
            Observable::EntanglementEntropy { bond } => {
                if let Some(bond) = bond {
                    if *bond == 0 || *bond >= state.length() {
                        return Err(RompsError::invalid_argument(format!(
                            "entropy cut {bond} is outside 1..={}",
                            state.length() - 1
                        )));
                    }
                }
                Ok(())
            }
            Observable::StringOrder { i1, i2, order } => {
                if state.site_type() != SiteType::SpinOne {
                    return Err(RompsError::unsupported(
                        "string order is only defined for spin-1 sites",
                    ));
                }
                if !(1..=state.length()).contains(i1) || !(1..=state.length()).contains(i2) {
                    return Err(RompsError::invalid_argument(format!(
                        "string-order endpoints ({i1}, {i2}) leave the chain"
                    )));
                }
                match order {
                    1 => {
                        if i2 <= i1 {
                            return Err(RompsError::invalid_argument(
                                "string-order endpoints must be ordered i1 < i2",
                            ));
                        }
                        Ok(())
                    }
                    2 => {
                        // Endpoint blocks (i1, i1+1) and (i2-1, i2) must not overlap.
                        if *i2 < i1 + 3 {
                            return Err(RompsError::invalid_argument(format!(
                                "order-2 string order needs separation of at least 3, \
                                 got endpoints ({i1}, {i2})"
                            )));
                        }
                        if i1 + 1 > state.length() || *i2 < 2 {
                            return Err(RompsError::invalid_argument(
                                "order-2 endpoint blocks leave the chain",
                            ));
                        }
                        Ok(())
                    }
                    other => Err(RompsError::invalid_argument(format!(
                        "string order of order {other} is not defined"
                    ))),
                }
            }
            Observable::MaxBondDim => Ok(()),
        }
    }

    /// Evaluates the observable on a state.
    ///
    /// # Arguments
    ///
    /// * `state` - The state to evaluate on; must be initialized.
    /// * `i1` - Record-time site index; overrides and serves registrations made
    ///   without one.
    pub fn evaluate(
        &self,
        state: &SimulationState,
        i1: Option<usize>,
    ) -> Result<f64, RompsError> {
        let mps = state.mps().ok_or_else(|| {
            RompsError::invalid_argument("cannot evaluate observables before initialization")
        })?;
        match self {
            Observable::DomainWall { i1: registered } => {
                let site = i1.or(*registered);
                match site {
                    Some(site) => {
                        check_bond_site(site, state)?;
                        domain_wall_density(state, site)
                    }
                    None => {
                        let mut total = 0.0;
                        for site in 1..state.length() {
                            total += domain_wall_density(state, site)?;
                        }
                        if state.boundary_condition() != BoundaryCondition::Open {
                            total += domain_wall_density(state, state.length())?;
                        }
                        Ok(total)
                    }
                }
            }
            Observable::EntanglementEntropy { bond } => {
                let cut = bond.unwrap_or(state.length() / 2);
                mps.entanglement_entropy(cut)
            }
            Observable::StringOrder { i1, i2, order } => string_order(state, *i1, *i2, *order),
            Observable::MaxBondDim => Ok(mps.max_bond_dim() as f64),
        }
    }
}

/// Checks that `site` starts a nearest-neighbour bond of the chain.
fn check_bond_site(site: usize, state: &SimulationState) -> Result<(), RompsError> {
    let length = state.length();
    let open = state.boundary_condition() == BoundaryCondition::Open;
    let upper = if open { length - 1 } else { length };
    if site == 0 || site > upper {
        return Err(RompsError::invalid_argument(format!(
            "bond site {site} is outside 1..={upper}"
        )));
    }
    Ok(())
}

/// Local domain-wall density `(1 - <Z_i Z_{i+1}>) / 2` at the bond starting at `site`.
fn domain_wall_density(state: &SimulationState, site: usize) -> Result<f64, RompsError> {
    let mps = state.mps().ok_or_else(|| {
        RompsError::invalid_argument("cannot evaluate observables before initialization")
    })?;
    let partner = if site == state.length() { 1 } else { site + 1 };
    let ops: Vec<(usize, Array2<Complex64>)> = vec![
        (state.basis().ram(site), pauli_z()),
        (state.basis().ram(partner), pauli_z()),
    ];
    let correlation = mps.expectation_product(&ops)?.re;
    Ok((1.0 - correlation) / 2.0)
}

/// String-order correlator with endpoint order 1 or 2.
fn string_order(
    state: &SimulationState,
    i1: usize,
    i2: usize,
    order: usize,
) -> Result<f64, RompsError> {
    let mps = state.mps().ok_or_else(|| {
        RompsError::invalid_argument("cannot evaluate observables before initialization")
    })?;
    let sz = spin_one_sz();
    let phase = spin_one_string_phase();
    let mut ops: Vec<(usize, Array2<Complex64>)> = Vec::new();
    let (string_from, string_to) = match order {
        1 => {
            ops.push((state.basis().ram(i1), sz.clone()));
            ops.push((state.basis().ram(i2), sz));
            (i1 + 1, i2 - 1)
        }
        2 => {
            ops.push((state.basis().ram(i1), sz.clone()));
            ops.push((state.basis().ram(i1 + 1), sz.clone()));
            ops.push((state.basis().ram(i2 - 1), sz.clone()));
            ops.push((state.basis().ram(i2), sz));
            (i1 + 2, i2 - 2)
        }
        other => {
            return Err(RompsError::invalid_argument(format!(
                "string order of order {other} is not defined"
            )))
        }
    };
    for site in string_from..=string_to {
        ops.push((state.basis().ram(site), phase.clone()));
    }
    Ok(mps.expectation_product(&ops)?.re)
}
