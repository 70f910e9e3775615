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

//! The gate-application engine.
//!
//! [apply] is the dispatch point: it resolves a geometry into concrete physical sites,
//! routes composite gates through the per-site Born-measurement path, advances
//! staircases after their application, and loops over the elements of compound
//! geometries. [apply_to_sites] is the site-level primitive shared by all paths; it
//! translates physical labels to RAM positions, builds the gate's operator, applies it
//! with the state's truncation parameters, and renormalizes exactly when the gate kind
//! requires it.

use crate::circuit::{select_branch, validate_outcomes, Outcome};
use crate::geometry::Geometry;
use crate::mps::{MatrixProductState, SiteOperator};
use crate::operations::{
    measurement_projectors, pauli_x, Gate, GateContext, MeasurementBasis,
};
use crate::rng::StreamName;
use crate::state::SimulationState;
use crate::RompsError;

/// Applies a gate over a geometry.
///
/// Static geometries compute their sites and apply once. Staircases additionally
/// advance their position after the application; pointers never advance on their own.
/// Compound geometries expand into elements and apply once per element, in enumeration
/// order.
///
/// # Arguments
///
/// * `state` - The initialized state the gate acts on.
/// * `gate` - The gate to apply.
/// * `geometry` - The placement; mutated only for staircases, after the site list has
///   been read.
///
/// # Returns
///
/// * `Err(RompsError)` - The state is uninitialized, the geometry leaves the chain, or
///   the gate rejects the sites.
pub fn apply(
    state: &mut SimulationState,
    gate: &Gate,
    geometry: &mut Geometry,
) -> Result<(), RompsError> {
    let length = state.length;
    let bc = state.bc;
    if geometry.is_compound() {
        for element in geometry.elements(length, bc)? {
            apply_to_sites(state, gate, &element)?;
        }
        Ok(())
    } else {
        let sites = geometry.sites(length, bc)?;
        apply_to_sites(state, gate, &sites)?;
        geometry.advance(length, bc);
        Ok(())
    }
}

/// Applies a gate to an explicit list of physical sites.
///
/// Composite gates require exactly one site and run through the Born-measurement path;
/// every other gate builds its operator against the RAM translation of the sites and
/// applies it with the state's cutoff and maximum bond dimension. Projective gates
/// renormalize afterwards; unitary gates are left untouched.
///
/// # Arguments
///
/// * `state` - The initialized state the gate acts on.
/// * `gate` - The gate to apply.
/// * `sites` - Physical sites, exactly `gate.support()` many, distinct.
pub fn apply_to_sites(
    state: &mut SimulationState,
    gate: &Gate,
    sites: &[usize],
) -> Result<(), RompsError> {
    require_mps(state)?;
    if gate.is_composite() {
        if sites.len() != 1 {
            return Err(RompsError::invalid_argument(format!(
                "composite gate {} measures exactly one site, got {sites:?}",
                gate.label()
            )));
        }
        return match gate {
            Gate::Measurement { basis } => measure_site(state, sites[0], *basis).map(|_| ()),
            Gate::Reset => reset_site(state, sites[0]).map(|_| ()),
            _ => Err(RompsError::internal("composite dispatch on a plain gate")),
        };
    }
    if sites.len() != gate.support() {
        return Err(RompsError::invalid_argument(format!(
            "gate {} acts on {} sites, got {sites:?}",
            gate.label(),
            gate.support()
        )));
    }
    let mut ram_sites = translate_sites(state, sites)?;
    ram_sites.sort_unstable();
    let op = {
        let mps_ref = state.mps.as_ref();
        let mut context = GateContext {
            rng: &mut state.rng,
            mps: mps_ref,
        };
        gate.build_operator(&ram_sites, state.local_dim, &mut context)?
    };
    let cutoff = state.cutoff;
    let maxdim = state.maxdim;
    let mps = require_mps_mut(state)?;
    mps.apply_operator(&op, cutoff, maxdim)?;
    if gate.requires_normalization() {
        mps.normalize()?;
    }
    Ok(())
}

/// Performs one Born measurement of a single site.
///
/// Computes `p0 = <psi|P0|psi>`, draws one value from the `born` stream, picks
/// outcome 0 when the draw lies below `p0` and outcome 1 otherwise, applies the
/// corresponding projector and renormalizes.
///
/// # Arguments
///
/// * `state` - The initialized state.
/// * `site` - The measured physical site.
/// * `basis` - The measurement basis; qubit chains only.
///
/// # Returns
///
/// * `Ok(u8)` - The sampled outcome, 0 or 1.
pub fn measure_site(
    state: &mut SimulationState,
    site: usize,
    basis: MeasurementBasis,
) -> Result<u8, RompsError> {
    if state.local_dim != 2 {
        return Err(RompsError::unsupported(format!(
            "projective measurement is only implemented for local dimension 2, got {}",
            state.local_dim
        )));
    }
    let ram = translate_sites(state, &[site])?[0];
    let (projector_zero, projector_one) = measurement_projectors(basis);
    let probability_zero = require_mps(state)?.born_probability(ram, &projector_zero)?;
    let draw = state.rng.draw(StreamName::Born);
    let (outcome, projector) = if draw < probability_zero {
        (0, projector_zero)
    } else {
        (1, projector_one)
    };
    let op = SiteOperator::new(projector, vec![ram], state.local_dim)?;
    let cutoff = state.cutoff;
    let maxdim = state.maxdim;
    let mps = require_mps_mut(state)?;
    mps.apply_operator(&op, cutoff, maxdim)?;
    mps.normalize()?;
    Ok(outcome)
}

/// Resets one site to |0>: a computational-basis measurement followed by a Pauli-X
/// when the outcome was 1.
///
/// Draws the `born` stream exactly once, like a plain measurement.
///
/// # Arguments
///
/// * `state` - The initialized state.
/// * `site` - The reset physical site.
///
/// # Returns
///
/// * `Ok(u8)` - The measurement outcome before the flip.
pub fn reset_site(state: &mut SimulationState, site: usize) -> Result<u8, RompsError> {
    let outcome = measure_site(state, site, MeasurementBasis::Z)?;
    if outcome == 1 {
        let ram = translate_sites(state, &[site])?[0];
        let flip = SiteOperator::new(pauli_x(), vec![ram], state.local_dim)?;
        let cutoff = state.cutoff;
        let maxdim = state.maxdim;
        require_mps_mut(state)?.apply_operator(&flip, cutoff, maxdim)?;
    }
    Ok(outcome)
}

/// Applies one branch of a stochastic outcome list.
///
/// Consumes exactly one draw from the named stream, whether or not a branch is
/// selected; the residual probability mass is the implicit "do nothing" branch.
///
/// # Arguments
///
/// * `state` - The initialized state.
/// * `stream` - The stream the selection draw comes from.
/// * `outcomes` - The branches; validated before the draw.
///
/// # Returns
///
/// * `Ok(Some(index))` - The selected branch.
/// * `Ok(None)` - The implicit "do nothing" branch.
pub fn apply_with_prob(
    state: &mut SimulationState,
    stream: StreamName,
    outcomes: &mut [Outcome],
) -> Result<Option<usize>, RompsError> {
    validate_outcomes(outcomes)?;
    let draw = state.rng.draw(stream);
    match select_branch(draw, outcomes) {
        Some(index) => {
            let gate = outcomes[index].gate.clone();
            apply(state, &gate, &mut outcomes[index].geometry)?;
            Ok(Some(index))
        }
        None => Ok(None),
    }
}

/// Translates physical sites to RAM positions, validating range and distinctness.
fn translate_sites(state: &SimulationState, sites: &[usize]) -> Result<Vec<usize>, RompsError> {
    let mut ram_sites = Vec::with_capacity(sites.len());
    for &site in sites {
        if !state.basis.contains(site) {
            return Err(RompsError::invalid_argument(format!(
                "site {site} is outside the chain 1..={}",
                state.length
            )));
        }
        ram_sites.push(state.basis.ram(site));
    }
    for (index, ram) in ram_sites.iter().enumerate() {
        if ram_sites[..index].contains(ram) {
            return Err(RompsError::invalid_argument(format!(
                "sites {sites:?} contain a duplicate"
            )));
        }
    }
    Ok(ram_sites)
}

fn require_mps(state: &SimulationState) -> Result<&MatrixProductState, RompsError> {
    state.mps.as_ref().ok_or_else(|| {
        RompsError::invalid_argument("state must be initialized before gates are applied")
    })
}

fn require_mps_mut(state: &mut SimulationState) -> Result<&mut MatrixProductState, RompsError> {
    state.mps.as_mut().ok_or_else(|| {
        RompsError::invalid_argument("state must be initialized before gates are applied")
    })
}
