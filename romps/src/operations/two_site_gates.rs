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

//! Dense matrices of the two-site gates: CZ, Haar-random unitaries and the spin-1
//! total-spin sector projectors.

use crate::operations::validate_sectors;
use crate::RompsError;
use ndarray::linalg::kron;
use ndarray::{array, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

/// The controlled-Z matrix.
pub fn cz_matrix() -> Array2<Complex64> {
    let mut matrix = Array2::zeros((4, 4));
    matrix[[0, 0]] = Complex64::new(1.0, 0.0);
    matrix[[1, 1]] = Complex64::new(1.0, 0.0);
    matrix[[2, 2]] = Complex64::new(1.0, 0.0);
    matrix[[3, 3]] = Complex64::new(-1.0, 0.0);
    matrix
}

/// A Haar-distributed random unitary of the given dimension.
///
/// Drawn as a complex Ginibre matrix factorized with QR; the phases of the triangular
/// factor's diagonal are absorbed into Q so the distribution is exactly Haar. Consumes
/// `2 * dim^2` Gaussian draws from the stream, row by row, real part before imaginary
/// part.
///
/// # Arguments
///
/// * `dim` - The matrix dimension.
/// * `rng` - The stream the Gaussian entries are drawn from.
pub fn haar_unitary(dim: usize, rng: &mut StdRng) -> Array2<Complex64> {
    let normal = StandardNormal;
    let ginibre = Array2::from_shape_fn((dim, dim), |_| {
        Complex64::new(normal.sample(rng), normal.sample(rng))
    });
    let (q, r) = crate::mps::thin_qr(&ginibre);
    let mut unitary = q;
    for col in 0..dim {
        let diagonal = r[[col, col]];
        let phase = if diagonal.norm() > 0.0 {
            diagonal / diagonal.norm()
        } else {
            Complex64::new(1.0, 0.0)
        };
        for row in 0..dim {
            unitary[[row, col]] *= phase;
        }
    }
    unitary
}

/// The spin-1 Sz matrix in the basis (|+1>, |0>, |-1>).
pub fn spin_one_sz() -> Array2<Complex64> {
    array![
        [
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0)
        ],
        [
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0)
        ],
        [
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(-1.0, 0.0)
        ]
    ]
}

/// The spin-1 Sx matrix in the basis (|+1>, |0>, |-1>).
pub fn spin_one_sx() -> Array2<Complex64> {
    let inv_sqrt2 = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    array![
        [zero, inv_sqrt2, zero],
        [inv_sqrt2, zero, inv_sqrt2],
        [zero, inv_sqrt2, zero]
    ]
}

/// The spin-1 Sy matrix in the basis (|+1>, |0>, |-1>).
pub fn spin_one_sy() -> Array2<Complex64> {
    let value = Complex64::new(0.0, std::f64::consts::FRAC_1_SQRT_2);
    let zero = Complex64::new(0.0, 0.0);
    array![
        [zero, -value, zero],
        [value, zero, -value],
        [zero, value, zero]
    ]
}

/// The string operator exp(i pi Sz) of one spin-1 site: diag(-1, 1, -1).
pub fn spin_one_string_phase() -> Array2<Complex64> {
    array![
        [
            Complex64::new(-1.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0)
        ],
        [
            Complex64::new(0.0, 0.0),
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 0.0)
        ],
        [
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(-1.0, 0.0)
        ]
    ]
}

/// The Heisenberg coupling S1.S2 of a spin-1 pair as a 9x9 matrix.
fn spin_one_coupling() -> Array2<Complex64> {
    let sx = spin_one_sx();
    let sy = spin_one_sy();
    let sz = spin_one_sz();
    kron(&sx, &sx) + kron(&sy, &sy) + kron(&sz, &sz)
}

/// Projector onto one total-spin sector of a spin-1 pair.
///
/// Built from the spectral polynomial in S1.S2, whose eigenvalues are -2, -1 and +1 in
/// the sectors s = 0, 1, 2. The projectors are complete, idempotent, mutually
/// orthogonal, and have trace 2s + 1.
///
/// # Arguments
///
/// * `sector` - The total spin s in {0, 1, 2}.
pub fn spin_sector_projector(sector: usize) -> Result<Array2<Complex64>, RompsError> {
    let coupling = spin_one_coupling();
    let identity = Array2::<Complex64>::eye(9);
    let shifted = |offset: f64| &coupling + &(identity.clone() * Complex64::new(offset, 0.0));
    let projector = match sector {
        // (M + 1)(M - 1) / 3
        0 => shifted(1.0).dot(&shifted(-1.0)) / Complex64::new(3.0, 0.0),
        // -(M + 2)(M - 1) / 2
        1 => shifted(2.0).dot(&shifted(-1.0)) / Complex64::new(-2.0, 0.0),
        // (M + 2)(M + 1) / 6
        2 => shifted(2.0).dot(&shifted(1.0)) / Complex64::new(6.0, 0.0),
        _ => {
            return Err(RompsError::invalid_argument(format!(
                "spin sector {sector} does not exist for a spin-1 pair"
            )))
        }
    };
    Ok(projector)
}

/// Sum of the projectors of several total-spin sectors.
///
/// # Arguments
///
/// * `sectors` - Distinct sectors from {0, 1, 2}, at least one.
pub fn spin_sector_projector_sum(sectors: &[usize]) -> Result<Array2<Complex64>, RompsError> {
    validate_sectors(sectors)?;
    let mut sum = Array2::<Complex64>::zeros((9, 9));
    for &sector in sectors {
        sum = sum + spin_sector_projector(sector)?;
    }
    Ok(sum)
}
