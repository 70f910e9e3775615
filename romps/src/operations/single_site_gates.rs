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

//! Dense matrices of the single-site gates.

use crate::operations::MeasurementBasis;
use crate::RompsError;
use ndarray::{array, Array2};
use num_complex::Complex64;

/// The Pauli-X matrix.
pub fn pauli_x() -> Array2<Complex64> {
    array![
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
    ]
}

/// The Pauli-Y matrix.
pub fn pauli_y() -> Array2<Complex64> {
    array![
        [Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)],
        [Complex64::new(0.0, 1.0), Complex64::new(0.0, 0.0)]
    ]
}

/// The Pauli-Z matrix.
pub fn pauli_z() -> Array2<Complex64> {
    array![
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(-1.0, 0.0)]
    ]
}

/// Projector onto one local basis state of a d-dimensional site.
///
/// # Arguments
///
/// * `outcome` - The 0-based basis state projected onto.
/// * `local_dim` - The local Hilbert dimension d.
///
/// # Returns
///
/// * `Ok(Array2<Complex64>)` - The rank-one projector.
/// * `Err(RompsError)` - `outcome` is outside 0..d.
pub fn basis_projector(outcome: usize, local_dim: usize) -> Result<Array2<Complex64>, RompsError> {
    if outcome >= local_dim {
        return Err(RompsError::invalid_argument(format!(
            "projection outcome {outcome} is outside the local dimension {local_dim}"
        )));
    }
    let mut projector = Array2::zeros((local_dim, local_dim));
    projector[[outcome, outcome]] = Complex64::new(1.0, 0.0);
    Ok(projector)
}

/// The outcome-0 and outcome-1 projectors of a qubit measurement basis.
///
/// Outcome 0 is the +1 eigenvector of the corresponding Pauli operator.
pub fn measurement_projectors(
    basis: MeasurementBasis,
) -> (Array2<Complex64>, Array2<Complex64>) {
    let half = Complex64::new(0.5, 0.0);
    let half_i = Complex64::new(0.0, 0.5);
    match basis {
        MeasurementBasis::Z => {
            let zero = array![
                [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
                [Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)]
            ];
            let one = array![
                [Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
                [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
            ];
            (zero, one)
        }
        MeasurementBasis::X => {
            let plus = array![[half, half], [half, half]];
            let minus = array![[half, -half], [-half, half]];
            (plus, minus)
        }
        MeasurementBasis::Y => {
            let plus = array![[half, -half_i], [half_i, half]];
            let minus = array![[half, half_i], [-half_i, half]];
            (plus, minus)
        }
    }
}
