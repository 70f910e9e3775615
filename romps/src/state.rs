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

//! The mutable state of one simulated trajectory.
//!
//! A [SimulationState] owns everything a trajectory needs exclusively: the MPS, the
//! basis mapping, the truncation parameters, the named random streams, and the recorded
//! observable series. Distinct states never share resources, so independent
//! trajectories may run on separate threads.

use crate::basis::{BasisMap, BoundaryCondition};
use crate::mps::MatrixProductState;
use crate::observables::Observable;
use crate::rng::{RngRegistry, StreamName};
use crate::RompsError;
use std::collections::HashMap;

/// The kind of local Hilbert space at every site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SiteType {
    /// Two-level systems, local dimension 2.
    Qubit,
    /// Spin-1 sites, local dimension 3, basis (|+1>, |0>, |-1>).
    SpinOne,
    /// Generic qudits with an explicitly chosen local dimension.
    Qudit,
}

impl std::fmt::Display for SiteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteType::Qubit => write!(f, "Qubit"),
            SiteType::SpinOne => write!(f, "S=1"),
            SiteType::Qudit => write!(f, "Qudit"),
        }
    }
}

/// Bit pattern selecting a computational-basis product state.
///
/// The three forms are mutually exclusive by construction. Bits are placed with the
/// most significant bit at site 1 and the least significant bit at site L.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductStatePattern {
    /// Binary digits of an unsigned integer, left-padded with zeros to L bits.
    BinaryInt(u64),
    /// A value `0.xxx` whose fractional digits are 0/1 only; the digits form the bit
    /// pattern left-aligned, padded with zeros.
    BinaryDecimal(f64),
    /// An explicit 0/1 string; shorter strings are right-padded with zeros, longer
    /// strings are truncated to L.
    Bitstring(String),
}

/// Specification of the initial state of a trajectory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum InitSpec {
    /// A computational-basis product state described by a bit pattern.
    ProductState(ProductStatePattern),
    /// A product state given as one explicit local basis index (0-based) per physical
    /// site; the general form needed for states such as an all-|0> spin-1 chain.
    StateIndices(Vec<usize>),
    /// A normalized random MPS drawn from the `state_init` stream.
    RandomMps {
        /// Maximum bond dimension of the random state.
        bond_dim: usize,
    },
}

/// The complete state of one simulated trajectory.
#[derive(Debug)]
pub struct SimulationState {
    /// The matrix-product state; absent until [SimulationState::initialize] runs.
    pub(crate) mps: Option<MatrixProductState>,
    /// Physical site per RAM position, in RAM order.
    pub(crate) sites: Vec<usize>,
    /// Bidirectional physical/RAM mapping.
    pub(crate) basis: BasisMap,
    /// Number of sites L.
    pub(crate) length: usize,
    /// Boundary condition of the chain.
    pub(crate) bc: BoundaryCondition,
    /// Kind of local Hilbert space.
    pub(crate) site_type: SiteType,
    /// Local Hilbert dimension d.
    pub(crate) local_dim: usize,
    /// Relative discarded-weight cutoff of SVD truncations.
    pub(crate) cutoff: f64,
    /// Hard cap on bond dimensions.
    pub(crate) maxdim: usize,
    /// The named random streams of this trajectory.
    pub(crate) rng: RngRegistry,
    /// Registered observables in registration order.
    pub(crate) observables: Vec<(String, Observable)>,
    /// Recorded series per observable name; append-only.
    pub(crate) series: HashMap<String, Vec<f64>>,
}

impl SimulationState {
    /// Creates a state for a chain of `length` sites under the given boundary
    /// condition.
    ///
    /// Defaults: qubit sites, local dimension 2, cutoff 1e-10, maximum bond dimension
    /// 100, deterministically seeded random streams.
    ///
    /// # Arguments
    ///
    /// * `length` - The number of physical sites, at least 2.
    /// * `bc` - The boundary condition; periodic variants require even `length`.
    pub fn new(length: usize, bc: BoundaryCondition) -> Result<Self, RompsError> {
        let basis = BasisMap::new(length, bc)?;
        let sites = basis.sites_in_ram_order();
        Ok(Self {
            mps: None,
            sites,
            basis,
            length,
            bc,
            site_type: SiteType::Qubit,
            local_dim: 2,
            cutoff: 1e-10,
            maxdim: 100,
            rng: RngRegistry::default(),
            observables: Vec::new(),
            series: HashMap::new(),
        })
    }

    /// Sets the site type, adjusting the local dimension to its default (2 for qubits,
    /// 3 for spin-1; qudits keep the current dimension until
    /// [SimulationState::with_local_dim] chooses one).
    pub fn with_site_type(mut self, site_type: SiteType) -> Self {
        self.site_type = site_type;
        match site_type {
            SiteType::Qubit => self.local_dim = 2,
            SiteType::SpinOne => self.local_dim = 3,
            SiteType::Qudit => {}
        }
        self
    }

    /// Sets the local Hilbert dimension.
    ///
    /// # Returns
    ///
    /// * `Err(RompsError)` - The dimension contradicts the site type (qubits are 2,
    ///   spin-1 is 3, qudits need at least 2).
    pub fn with_local_dim(mut self, local_dim: usize) -> Result<Self, RompsError> {
        match (self.site_type, local_dim) {
            (SiteType::Qubit, 2) | (SiteType::SpinOne, 3) => {}
            (SiteType::Qudit, dim) if dim >= 2 => {}
            (site_type, dim) => {
                return Err(RompsError::invalid_argument(format!(
                    "local dimension {dim} is inconsistent with site type {site_type}"
                )))
            }
        }
        self.local_dim = local_dim;
        Ok(self)
    }

    /// Sets the relative discarded-weight cutoff of SVD truncations.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Sets the hard cap on bond dimensions.
    pub fn with_maxdim(mut self, maxdim: usize) -> Self {
        self.maxdim = maxdim;
        self
    }

    /// Replaces the random-stream registry, typically with explicitly seeded streams.
    pub fn with_rng(mut self, rng: RngRegistry) -> Self {
        self.rng = rng;
        self
    }

    /// Returns the number of physical sites.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the boundary condition of the chain.
    pub fn boundary_condition(&self) -> BoundaryCondition {
        self.bc
    }

    /// Returns the kind of local Hilbert space.
    pub fn site_type(&self) -> SiteType {
        self.site_type
    }

    /// Returns the local Hilbert dimension.
    pub fn local_dim(&self) -> usize {
        self.local_dim
    }

    /// Returns the basis mapping between physical sites and RAM positions.
    pub fn basis(&self) -> &BasisMap {
        &self.basis
    }

    /// Returns the physical site per RAM position, in RAM order.
    pub fn sites(&self) -> &[usize] {
        &self.sites
    }

    /// Returns the MPS, if the state has been initialized.
    pub fn mps(&self) -> Option<&MatrixProductState> {
        self.mps.as_ref()
    }

    /// Returns mutable access to the named random streams of this trajectory.
    pub fn rng_mut(&mut self) -> &mut RngRegistry {
        &mut self.rng
    }

    /// Returns true once [SimulationState::initialize] has run.
    pub fn is_initialized(&self) -> bool {
        self.mps.is_some()
    }

    /// Initializes the MPS.
    ///
    /// # Arguments
    ///
    /// * `spec` - The initial state: a bit-pattern product state, explicit local basis
    ///   indices, or a random MPS drawn from the `state_init` stream.
    ///
    /// # Returns
    ///
    /// * `Err(RompsError)` - Malformed pattern, index outside the local dimension, or
    ///   an index list whose length is not L.
    pub fn initialize(&mut self, spec: InitSpec) -> Result<(), RompsError> {
        let local_states_phy: Vec<usize> = match &spec {
            InitSpec::ProductState(pattern) => {
                let bits = pattern.bits(self.length)?;
                bits.iter()
                    .map(|bit| self.local_index_for_bit(*bit))
                    .collect()
            }
            InitSpec::StateIndices(indices) => {
                if indices.len() != self.length {
                    return Err(RompsError::invalid_argument(format!(
                        "state index list has length {} but the chain has {} sites",
                        indices.len(),
                        self.length
                    )));
                }
                indices.clone()
            }
            InitSpec::RandomMps { bond_dim } => {
                let mps = MatrixProductState::random(
                    self.length,
                    self.local_dim,
                    *bond_dim,
                    self.rng.stream(StreamName::StateInit),
                )?;
                self.mps = Some(mps);
                return Ok(());
            }
        };
        // Reorder from physical labels to RAM positions before building the chain.
        let mut local_states_ram = Vec::with_capacity(self.length);
        for ram in 1..=self.length {
            local_states_ram.push(local_states_phy[self.basis.phy(ram) - 1]);
        }
        self.mps = Some(MatrixProductState::product_state(
            &local_states_ram,
            self.local_dim,
        )?);
        Ok(())
    }

    /// Maps a bit symbol to the local basis index of the site type.
    ///
    /// Qubits and qudits use states 0 and 1; spin-1 maps "0" to |+1> and "1" to |-1>.
    fn local_index_for_bit(&self, bit: u8) -> usize {
        match (self.site_type, bit) {
            (SiteType::SpinOne, 1) => 2,
            (_, bit) => bit as usize,
        }
    }

    /// Registers an observable under a unique name.
    ///
    /// # Arguments
    ///
    /// * `name` - The series name; must not be registered yet.
    /// * `observable` - The observable specification.
    ///
    /// # Returns
    ///
    /// * `Err(RompsError)` - Duplicate name, or the observable is invalid for this
    ///   state (wrong site type, out-of-range indices, insufficient string-order
    ///   separation).
    pub fn track(&mut self, name: &str, observable: Observable) -> Result<(), RompsError> {
        if self.observables.iter().any(|(n, _)| n == name) {
            return Err(RompsError::invalid_argument(format!(
                "observable name {name} is already registered"
            )));
        }
        observable.validate(self)?;
        self.observables.push((name.to_string(), observable));
        self.series.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Evaluates every registered observable and appends one scalar per series.
    ///
    /// # Arguments
    ///
    /// * `i1` - Optional site index consumed by observables registered without one
    ///   (the domain-wall family).
    ///
    /// # Returns
    ///
    /// * `Err(RompsError)` - The state is not initialized, or an observable fails to
    ///   evaluate.
    pub fn record(&mut self, i1: Option<usize>) -> Result<(), RompsError> {
        if self.mps.is_none() {
            return Err(RompsError::invalid_argument(
                "cannot record observables before the state is initialized",
            ));
        }
        let mut values = Vec::with_capacity(self.observables.len());
        for (name, observable) in &self.observables {
            values.push((name.clone(), observable.evaluate(self, i1)?));
        }
        for (name, value) in values {
            if let Some(series) = self.series.get_mut(&name) {
                series.push(value);
            }
        }
        Ok(())
    }

    /// Returns the registered observable names, in registration order.
    pub fn tracked_names(&self) -> Vec<String> {
        self.observables.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Returns the recorded series of one observable.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|series| series.as_slice())
    }
}

impl ProductStatePattern {
    /// Expands the pattern into one bit per physical site.
    pub(crate) fn bits(&self, length: usize) -> Result<Vec<u8>, RompsError> {
        match self {
            ProductStatePattern::BinaryInt(value) => {
                let digits = format!("{value:b}");
                if digits.len() > length {
                    return Err(RompsError::invalid_argument(format!(
                        "integer {value} needs {} bits but the chain has {length} sites",
                        digits.len()
                    )));
                }
                let mut bits = vec![0_u8; length - digits.len()];
                bits.extend(digits.bytes().map(|byte| byte - b'0'));
                Ok(bits)
            }
            ProductStatePattern::BinaryDecimal(value) => {
                if *value == 0.0 {
                    return Ok(vec![0_u8; length]);
                }
                let printed = format!("{value}");
                let fraction = printed.strip_prefix("0.").ok_or_else(|| {
                    RompsError::invalid_argument(format!(
                        "binary decimal must look like 0.xxx, got {printed}"
                    ))
                })?;
                if fraction.is_empty() || fraction.bytes().any(|byte| byte != b'0' && byte != b'1')
                {
                    return Err(RompsError::invalid_argument(format!(
                        "fractional part of binary decimal must be 0/1 digits, got {printed}"
                    )));
                }
                let mut bits: Vec<u8> = fraction
                    .bytes()
                    .take(length)
                    .map(|byte| byte - b'0')
                    .collect();
                bits.resize(length, 0);
                Ok(bits)
            }
            ProductStatePattern::Bitstring(string) => {
                if string.bytes().any(|byte| byte != b'0' && byte != b'1') {
                    return Err(RompsError::invalid_argument(format!(
                        "bitstring must contain only 0/1, got {string}"
                    )));
                }
                let mut bits: Vec<u8> = string
                    .bytes()
                    .take(length)
                    .map(|byte| byte - b'0')
                    .collect();
                bits.resize(length, 0);
                Ok(bits)
            }
        }
    }
}
