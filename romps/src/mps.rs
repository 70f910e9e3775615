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

//! Truncated matrix-product-state representation and the low-level tensor engine.
//!
//! An MPS is a chain of rank-3 tensors with shape `(left bond, physical, right bond)`
//! and boundary bonds of dimension one. The engine keeps track of the orthogonality
//! center and moves it with QR/LQ sweeps, applies dense operators over arbitrary site
//! ranges with SVD retruncation, and offers read-only expectation values for the
//! observable layer.
//!
//! All site and bond indices in this module are 1-based RAM positions; translating
//! physical site labels to RAM positions is the job of [crate::basis::BasisMap].

use crate::RompsError;
use nalgebra::DMatrix;
use ndarray::{Array2, Array3, ArrayD, IxDyn};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use std::cmp::Ordering;

/// Norms below this threshold are treated as a vanished state.
pub(crate) const NORM_FLOOR: f64 = 1e-14;

/// A dense operator over a set of RAM sites.
///
/// The matrix acts on the combined physical index of the listed sites, ordered
/// ascending, most significant site first. The site list is carried structurally so the
/// apply engine recovers positions by identity rather than by parsing labels.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOperator {
    /// Dense matrix over the combined physical index of the touched sites.
    matrix: Array2<Complex64>,
    /// RAM positions the operator touches, ascending.
    ram_sites: Vec<usize>,
}

impl SiteOperator {
    /// Creates an operator over the given RAM sites.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Square matrix of dimension `d^n` for `n` touched sites.
    /// * `ram_sites` - The touched RAM positions, strictly ascending.
    /// * `local_dim` - The local Hilbert dimension d.
    ///
    /// # Returns
    ///
    /// * `Ok(SiteOperator)` - The validated operator.
    /// * `Err(RompsError)` - Matrix dimensions and site list do not agree, or the site
    ///   list is not strictly ascending.
    pub fn new(
        matrix: Array2<Complex64>,
        ram_sites: Vec<usize>,
        local_dim: usize,
    ) -> Result<Self, RompsError> {
        if ram_sites.is_empty() || ram_sites.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RompsError::internal(format!(
                "operator site list {ram_sites:?} is not strictly ascending"
            )));
        }
        let dim = local_dim.pow(ram_sites.len() as u32);
        if matrix.nrows() != dim || matrix.ncols() != dim {
            return Err(RompsError::internal(format!(
                "operator matrix is {}x{} but {} sites of local dimension {} require {dim}x{dim}",
                matrix.nrows(),
                matrix.ncols(),
                ram_sites.len(),
                local_dim
            )));
        }
        Ok(Self { matrix, ram_sites })
    }

    /// Returns the touched RAM sites, ascending.
    pub fn ram_sites(&self) -> &[usize] {
        &self.ram_sites
    }

    /// Returns the dense matrix of the operator.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }
}

/// A truncated matrix-product state over a uniform local dimension.
#[derive(Debug, Clone)]
pub struct MatrixProductState {
    /// Site tensors with shape (left bond, physical, right bond).
    tensors: Vec<Array3<Complex64>>,
    /// Uniform local Hilbert dimension.
    local_dim: usize,
    /// 1-based position of the orthogonality center, when known.
    center: Option<usize>,
}

impl MatrixProductState {
    /// Creates a product state from one local basis index per RAM position.
    ///
    /// Every bond has dimension one.
    ///
    /// # Arguments
    ///
    /// * `local_states` - Basis index (0-based) for each RAM position, in RAM order.
    /// * `local_dim` - The local Hilbert dimension d.
    ///
    /// # Returns
    ///
    /// * `Ok(MatrixProductState)` - The product state.
    /// * `Err(RompsError)` - A basis index is outside 0..d or the chain is empty.
    pub fn product_state(local_states: &[usize], local_dim: usize) -> Result<Self, RompsError> {
        if local_states.is_empty() {
            return Err(RompsError::invalid_argument(
                "cannot build a product state over zero sites",
            ));
        }
        let mut tensors = Vec::with_capacity(local_states.len());
        for &index in local_states {
            if index >= local_dim {
                return Err(RompsError::invalid_argument(format!(
                    "local state {index} is outside the local dimension {local_dim}"
                )));
            }
            let mut tensor = Array3::zeros((1, local_dim, 1));
            tensor[(0, index, 0)] = Complex64::new(1.0, 0.0);
            tensors.push(tensor);
        }
        Ok(Self {
            tensors,
            local_dim,
            center: Some(1),
        })
    }

    /// Creates a normalized random MPS with Gaussian tensor entries.
    ///
    /// Bond dimensions grow from the boundaries up to `bond_dim`, bounded by the
    /// entanglement capacity of each cut.
    ///
    /// # Arguments
    ///
    /// * `length` - The number of sites.
    /// * `local_dim` - The local Hilbert dimension d.
    /// * `bond_dim` - The maximum bond dimension of the random state.
    /// * `rng` - The random stream the entries are drawn from.
    pub fn random(
        length: usize,
        local_dim: usize,
        bond_dim: usize,
        rng: &mut StdRng,
    ) -> Result<Self, RompsError> {
        if length == 0 || bond_dim == 0 {
            return Err(RompsError::invalid_argument(
                "random MPS requires at least one site and bond dimension one",
            ));
        }
        // Capacity-limited bond dimensions: grow by d from the left, shrink towards
        // the right boundary.
        let mut bonds = vec![1_usize; length + 1];
        for k in 1..length {
            bonds[k] = (bonds[k - 1].saturating_mul(local_dim)).min(bond_dim);
        }
        for k in (1..length).rev() {
            bonds[k] = bonds[k].min((bonds[k + 1]).saturating_mul(local_dim));
        }
        let normal = StandardNormal;
        let mut tensors = Vec::with_capacity(length);
        for site in 0..length {
            let shape = (bonds[site], local_dim, bonds[site + 1]);
            let tensor = Array3::from_shape_fn(shape, |_| {
                Complex64::new(normal.sample(rng), normal.sample(rng))
            });
            tensors.push(tensor);
        }
        let mut mps = Self {
            tensors,
            local_dim,
            center: None,
        };
        mps.gauge_to(1)?;
        mps.normalize()?;
        Ok(mps)
    }

    /// Returns the number of sites of the chain.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns true when the chain holds no sites.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Returns the uniform local Hilbert dimension.
    pub fn local_dim(&self) -> usize {
        self.local_dim
    }

    /// Returns the tensor at the 1-based RAM position.
    pub fn tensor(&self, site: usize) -> &Array3<Complex64> {
        &self.tensors[site - 1]
    }

    /// Returns the largest bond dimension of the chain.
    pub fn max_bond_dim(&self) -> usize {
        self.tensors
            .iter()
            .map(|tensor| tensor.shape()[2])
            .max()
            .unwrap_or(0)
    }

    /// Moves the orthogonality center to the given 1-based site with QR/LQ sweeps.
    pub fn gauge_to(&mut self, site: usize) -> Result<(), RompsError> {
        let length = self.len();
        if site == 0 || site > length {
            return Err(RompsError::internal(format!(
                "gauge target {site} outside chain of length {length}"
            )));
        }
        match self.center {
            None => {
                for position in 1..site {
                    self.left_normalize_step(position)?;
                }
                for position in ((site + 1)..=length).rev() {
                    self.right_normalize_step(position)?;
                }
            }
            Some(center) if center < site => {
                for position in center..site {
                    self.left_normalize_step(position)?;
                }
            }
            Some(center) if center > site => {
                for position in ((site + 1)..=center).rev() {
                    self.right_normalize_step(position)?;
                }
            }
            Some(_) => {}
        }
        self.center = Some(site);
        Ok(())
    }

    /// QR-normalizes the tensor at `site` and absorbs the triangular factor into the
    /// right neighbour.
    fn left_normalize_step(&mut self, site: usize) -> Result<(), RompsError> {
        let tensor = self.tensors[site - 1].clone();
        let (left, phys, right) = tensor_shape(&tensor);
        let matrix = reshape2(tensor.into_dyn(), left * phys, right)?;
        let (q, r) = thin_qr(&matrix);
        let new_bond = q.ncols();
        self.tensors[site - 1] = reshape3(q.into_dyn(), left, phys, new_bond)?;
        let neighbour = self.tensors[site].clone();
        let (nl, np, nr) = tensor_shape(&neighbour);
        let neighbour_matrix = reshape2(neighbour.into_dyn(), nl, np * nr)?;
        let updated = r.dot(&neighbour_matrix);
        self.tensors[site] = reshape3(updated.into_dyn(), new_bond, np, nr)?;
        Ok(())
    }

    /// LQ-normalizes the tensor at `site` and absorbs the triangular factor into the
    /// left neighbour.
    fn right_normalize_step(&mut self, site: usize) -> Result<(), RompsError> {
        let tensor = self.tensors[site - 1].clone();
        let (left, phys, right) = tensor_shape(&tensor);
        let matrix = reshape2(tensor.into_dyn(), left, phys * right)?;
        // A = L Q with row-orthonormal Q, obtained from the QR factorization of the
        // adjoint: A^H = Q1 R1 implies A = R1^H Q1^H.
        let matrix_adjoint = adjoint(&matrix);
        let (q1, r1) = thin_qr(&matrix_adjoint);
        let l_factor = adjoint(&r1);
        let q_factor = adjoint(&q1);
        let new_bond = q_factor.nrows();
        self.tensors[site - 1] = reshape3(q_factor.into_dyn(), new_bond, phys, right)?;
        let neighbour = self.tensors[site - 2].clone();
        let (nl, np, nr) = tensor_shape(&neighbour);
        let neighbour_matrix = reshape2(neighbour.into_dyn(), nl * np, nr)?;
        let updated = neighbour_matrix.dot(&l_factor);
        self.tensors[site - 2] = reshape3(updated.into_dyn(), nl, np, new_bond)?;
        Ok(())
    }

    /// Returns the norm of the state.
    ///
    /// Cheap when the orthogonality center is known; otherwise a full transfer-matrix
    /// contraction.
    pub fn norm(&self) -> f64 {
        match self.center {
            Some(center) => frobenius(&self.tensors[center - 1]),
            None => {
                let value = self
                    .contract_with_ops(&[])
                    .map(|v| v.re)
                    .unwrap_or(f64::NAN);
                value.max(0.0).sqrt()
            }
        }
    }

    /// Rescales the state to unit norm.
    ///
    /// # Returns
    ///
    /// * `Err(RompsError::NumericalFailure)` - The state norm fell below 1e-14; there
    ///   is no direction left to normalize.
    pub fn normalize(&mut self) -> Result<(), RompsError> {
        let center = self.center.unwrap_or(1);
        self.gauge_to(center)?;
        let norm = frobenius(&self.tensors[center - 1]);
        if norm < NORM_FLOOR {
            return Err(RompsError::numerical(
                "state norm vanished; cannot normalize",
            ));
        }
        self.tensors[center - 1].mapv_inplace(|value| value / norm);
        Ok(())
    }

    /// Applies a dense operator and retruncates the touched bonds.
    ///
    /// The touched RAM positions are taken from the operator. The chain is gauged to
    /// the leftmost touched site, the covered tensor range is contracted into one
    /// working block, the operator acts on the touched physical axes (intermediate
    /// sites are passed through untouched), and the block is split back left to right
    /// with SVDs honoring `cutoff` (relative discarded weight) and `maxdim`.
    ///
    /// # Arguments
    ///
    /// * `op` - The operator and the RAM sites it touches.
    /// * `cutoff` - Maximum relative discarded squared Schmidt weight per split.
    /// * `maxdim` - Hard cap on the bond dimension after each split.
    pub fn apply_operator(
        &mut self,
        op: &SiteOperator,
        cutoff: f64,
        maxdim: usize,
    ) -> Result<(), RompsError> {
        let sites = op.ram_sites();
        let length = self.len();
        if sites.iter().any(|&site| site == 0 || site > length) {
            return Err(RompsError::internal(format!(
                "operator sites {sites:?} not found in a chain of length {length}"
            )));
        }
        let first = sites[0];
        let last = sites[sites.len() - 1];
        self.gauge_to(first)?;
        let block = self.contract_range(first, last)?;
        let offsets: Vec<usize> = sites.iter().map(|&site| site - first).collect();
        let block = apply_matrix_to_block(block, &offsets, op.matrix(), self.local_dim)?;
        self.split_block_back(block, first, last, cutoff, maxdim)
    }

    /// Contracts the tensors in `first..=last` into one block with shape
    /// `[left, d, d, ..., d, right]`.
    fn contract_range(&self, first: usize, last: usize) -> Result<ArrayD<Complex64>, RompsError> {
        let d = self.local_dim;
        let (left, _, mut right) = tensor_shape(&self.tensors[first - 1]);
        let mut phys_count = 1_usize;
        let mut block = reshape2(self.tensors[first - 1].clone().into_dyn(), left * d, right)?;
        for site in (first + 1)..=last {
            let tensor = &self.tensors[site - 1];
            let (tl, tp, tr) = tensor_shape(tensor);
            if tl != right {
                return Err(RompsError::internal(format!(
                    "bond mismatch between RAM sites {} and {site}",
                    site - 1
                )));
            }
            let matrix = reshape2(tensor.clone().into_dyn(), tl, tp * tr)?;
            let grown = block.dot(&matrix);
            phys_count += 1;
            right = tr;
            block = reshape2(
                grown.into_dyn(),
                left * d.pow(phys_count as u32),
                right,
            )?;
        }
        let mut shape = Vec::with_capacity(phys_count + 2);
        shape.push(left);
        shape.extend(std::iter::repeat(d).take(phys_count));
        shape.push(right);
        reshape_dyn(block.into_dyn(), &shape)
    }

    /// Splits a working block back into site tensors with truncated SVDs, writing into
    /// `first..=last` and leaving the orthogonality center on `last`.
    fn split_block_back(
        &mut self,
        block: ArrayD<Complex64>,
        first: usize,
        last: usize,
        cutoff: f64,
        maxdim: usize,
    ) -> Result<(), RompsError> {
        let d = self.local_dim;
        let span = last - first + 1;
        let shape = block.shape().to_vec();
        let left = shape[0];
        let right = shape[shape.len() - 1];
        if span == 1 {
            self.tensors[first - 1] = reshape3(block, left, d, right)?;
            self.center = Some(first);
            return Ok(());
        }
        let mut carry = reshape2(block, left * d, d.pow((span - 1) as u32) * right)?;
        let mut bond = left;
        for split in 0..(span - 1) {
            let rows = bond * d;
            let cols = d.pow((span - 2 - split) as u32) * right;
            let matrix = reshape2(carry.into_dyn(), rows, cols * d)?;
            let (u, values, vt) = svd_truncated(&matrix, cutoff, maxdim)?;
            let new_bond = values.len();
            self.tensors[first - 1 + split] = reshape3(u.into_dyn(), bond, d, new_bond)?;
            let mut weighted = vt;
            for (row, value) in values.iter().enumerate() {
                let scale = Complex64::new(*value, 0.0);
                weighted.row_mut(row).mapv_inplace(|entry| entry * scale);
            }
            carry = weighted;
            bond = new_bond;
        }
        self.tensors[last - 1] = reshape3(carry.into_dyn(), bond, d, right)?;
        self.center = Some(last);
        Ok(())
    }

    /// Expectation value of a joint dense operator over an ascending site range.
    ///
    /// Uses an internal gauged copy, so the state itself is untouched. The returned
    /// value is normalized by the state norm.
    ///
    /// # Arguments
    ///
    /// * `ram_sites` - The touched RAM positions, strictly ascending.
    /// * `matrix` - Dense matrix over the combined physical index of the sites.
    pub fn expectation_block(
        &self,
        ram_sites: &[usize],
        matrix: &Array2<Complex64>,
    ) -> Result<Complex64, RompsError> {
        let op = SiteOperator::new(matrix.clone(), ram_sites.to_vec(), self.local_dim)?;
        let mut gauged = self.clone();
        let first = op.ram_sites()[0];
        let last = op.ram_sites()[op.ram_sites().len() - 1];
        gauged.gauge_to(first)?;
        let block = gauged.contract_range(first, last)?;
        let offsets: Vec<usize> = op.ram_sites().iter().map(|&site| site - first).collect();
        let transformed = apply_matrix_to_block(block.clone(), &offsets, op.matrix(), self.local_dim)?;
        let mut value = Complex64::new(0.0, 0.0);
        let mut norm_sq = 0.0_f64;
        for (bra, ket) in block.iter().zip(transformed.iter()) {
            value += bra.conj() * ket;
            norm_sq += bra.norm_sqr();
        }
        if norm_sq < NORM_FLOOR {
            return Err(RompsError::numerical(
                "state norm vanished during expectation value",
            ));
        }
        Ok(value / norm_sq)
    }

    /// Expectation value of a product of single-site operators.
    ///
    /// Contracts the full chain with transfer matrices; read-only and valid for
    /// arbitrary (non-contiguous) site sets. The returned value is normalized by the
    /// state norm.
    ///
    /// # Arguments
    ///
    /// * `ops` - Pairs of 1-based RAM position and d×d matrix; positions must be
    ///   distinct.
    pub fn expectation_product(
        &self,
        ops: &[(usize, Array2<Complex64>)],
    ) -> Result<Complex64, RompsError> {
        for (site, matrix) in ops {
            if *site == 0 || *site > self.len() {
                return Err(RompsError::internal(format!(
                    "operator site {site} not found in a chain of length {}",
                    self.len()
                )));
            }
            if matrix.nrows() != self.local_dim || matrix.ncols() != self.local_dim {
                return Err(RompsError::internal(
                    "single-site operator does not match the local dimension",
                ));
            }
        }
        let value = self.contract_with_ops(ops)?;
        let norm_sq = self.contract_with_ops(&[])?.re;
        if norm_sq < NORM_FLOOR {
            return Err(RompsError::numerical(
                "state norm vanished during expectation value",
            ));
        }
        Ok(value / norm_sq)
    }

    /// Transfer-matrix contraction of `<psi| prod(ops) |psi>` without normalization.
    fn contract_with_ops(
        &self,
        ops: &[(usize, Array2<Complex64>)],
    ) -> Result<Complex64, RompsError> {
        let d = self.local_dim;
        // env[ket bond, bra bond]
        let mut env = Array2::<Complex64>::from_elem((1, 1), Complex64::new(1.0, 0.0));
        for (index, tensor) in self.tensors.iter().enumerate() {
            let site = index + 1;
            let (left, _, right) = tensor_shape(tensor);
            let ket = match ops.iter().find(|(s, _)| *s == site) {
                Some((_, matrix)) => apply_single_site(tensor, matrix)?,
                None => tensor.clone(),
            };
            // X[bra_left, phys, right] = sum_ket env[ket, bra] ket[ket, phys, right]
            let env_t = env.t().to_owned();
            let ket_matrix = reshape2(ket.into_dyn(), left, d * right)?;
            let x = env_t.dot(&ket_matrix);
            let bra_left = x.nrows();
            // env'[right, bra_right] = sum_{bra_left, phys} X conj(tensor)
            let x_matrix = reshape2(x.into_dyn(), bra_left * d, right)?;
            let bra_matrix = reshape2(tensor.clone().into_dyn(), left * d, right)?;
            let bra_conj = bra_matrix.mapv(|value| value.conj());
            env = x_matrix.t().to_owned().dot(&bra_conj);
        }
        Ok(env[(0, 0)])
    }

    /// Born probability `<psi|P|psi>` of a single-site projector, clamped to [0, 1].
    pub fn born_probability(
        &self,
        ram_site: usize,
        projector: &Array2<Complex64>,
    ) -> Result<f64, RompsError> {
        let value = self.expectation_block(&[ram_site], projector)?;
        Ok(value.re.clamp(0.0, 1.0))
    }

    /// Von Neumann entanglement entropy across the bond between RAM sites `bond` and
    /// `bond + 1`.
    ///
    /// Computed on an internal copy; the state is untouched.
    pub fn entanglement_entropy(&self, bond: usize) -> Result<f64, RompsError> {
        if bond == 0 || bond >= self.len() {
            return Err(RompsError::invalid_argument(format!(
                "bond {bond} is outside 1..={}",
                self.len() - 1
            )));
        }
        let mut gauged = self.clone();
        gauged.gauge_to(bond)?;
        let tensor = gauged.tensors[bond - 1].clone();
        let (left, phys, right) = tensor_shape(&tensor);
        let matrix = reshape2(tensor.into_dyn(), left * phys, right)?;
        let (_, values, _) = svd_truncated(&matrix, 0.0, usize::MAX)?;
        let total: f64 = values.iter().map(|value| value * value).sum();
        if total < NORM_FLOOR {
            return Err(RompsError::numerical(
                "state norm vanished during entropy evaluation",
            ));
        }
        let mut entropy = 0.0;
        for value in values {
            let p = value * value / total;
            if p > 1e-15 {
                entropy -= p * p.ln();
            }
        }
        Ok(entropy)
    }
}

/// Shape of a rank-3 site tensor.
fn tensor_shape(tensor: &Array3<Complex64>) -> (usize, usize, usize) {
    let shape = tensor.shape();
    (shape[0], shape[1], shape[2])
}

/// Frobenius norm of a site tensor.
fn frobenius(tensor: &Array3<Complex64>) -> f64 {
    tensor
        .iter()
        .map(|value| value.norm_sqr())
        .sum::<f64>()
        .sqrt()
}

/// Applies a d×d matrix to the physical axis of one tensor.
fn apply_single_site(
    tensor: &Array3<Complex64>,
    matrix: &Array2<Complex64>,
) -> Result<Array3<Complex64>, RompsError> {
    let (left, phys, right) = tensor_shape(tensor);
    let permuted = tensor.clone().permuted_axes([1, 0, 2]);
    let as_matrix = reshape2(permuted.into_dyn(), phys, left * right)?;
    let transformed = matrix.dot(&as_matrix);
    let back = reshape_dyn(transformed.into_dyn(), &[phys, left, right])?;
    let restored = back.permuted_axes(IxDyn(&[1, 0, 2]));
    reshape3(restored.into_dyn(), left, phys, right)
}

/// Applies a dense matrix over selected physical axes of a working block.
///
/// `offsets` are the touched physical axes (0-based within the block), ascending; the
/// matrix row/column index runs over those axes with the first offset most significant.
fn apply_matrix_to_block(
    block: ArrayD<Complex64>,
    offsets: &[usize],
    matrix: &Array2<Complex64>,
    local_dim: usize,
) -> Result<ArrayD<Complex64>, RompsError> {
    let shape = block.shape().to_vec();
    let phys_count = shape.len() - 2;
    let touched = offsets.len();
    let dim = local_dim.pow(touched as u32);
    if matrix.nrows() != dim || matrix.ncols() != dim {
        return Err(RompsError::internal(
            "operator matrix does not match the touched sites",
        ));
    }
    // Axis order: touched phys axes first, then left bond, untouched phys, right bond.
    let mut permutation: Vec<usize> = offsets.iter().map(|&offset| offset + 1).collect();
    permutation.push(0);
    for axis in 1..=phys_count {
        if !offsets.iter().any(|&offset| offset + 1 == axis) {
            permutation.push(axis);
        }
    }
    permutation.push(phys_count + 1);
    let rest: usize = permutation[touched..]
        .iter()
        .map(|&axis| shape[axis])
        .product();
    let permuted = block.permuted_axes(IxDyn(&permutation));
    let as_matrix = reshape2(
        permuted.as_standard_layout().to_owned().into_dyn(),
        dim,
        rest,
    )?;
    let transformed = matrix.dot(&as_matrix);
    let mut permuted_shape: Vec<usize> = Vec::with_capacity(shape.len());
    permuted_shape.extend(std::iter::repeat(local_dim).take(touched));
    for &axis in &permutation[touched..] {
        permuted_shape.push(shape[axis]);
    }
    let transformed = reshape_dyn(transformed.into_dyn(), &permuted_shape)?;
    // Invert the permutation.
    let mut inverse = vec![0_usize; permutation.len()];
    for (to, &from) in permutation.iter().enumerate() {
        inverse[from] = to;
    }
    let restored = transformed.permuted_axes(IxDyn(&inverse));
    Ok(restored.as_standard_layout().to_owned())
}

/// Reshapes a dynamic array into a matrix.
fn reshape2(
    array: ArrayD<Complex64>,
    rows: usize,
    cols: usize,
) -> Result<Array2<Complex64>, RompsError> {
    array
        .as_standard_layout()
        .to_owned()
        .into_shape_with_order((rows, cols))
        .map_err(|err| RompsError::internal(format!("tensor reshape failed: {err}")))
}

/// Reshapes a dynamic array into a rank-3 tensor.
fn reshape3(
    array: ArrayD<Complex64>,
    left: usize,
    phys: usize,
    right: usize,
) -> Result<Array3<Complex64>, RompsError> {
    array
        .as_standard_layout()
        .to_owned()
        .into_shape_with_order((left, phys, right))
        .map_err(|err| RompsError::internal(format!("tensor reshape failed: {err}")))
}

/// Reshapes a dynamic array into an arbitrary dynamic shape.
fn reshape_dyn(array: ArrayD<Complex64>, shape: &[usize]) -> Result<ArrayD<Complex64>, RompsError> {
    array
        .as_standard_layout()
        .to_owned()
        .into_shape_with_order(IxDyn(shape))
        .map_err(|err| RompsError::internal(format!("tensor reshape failed: {err}")))
}

fn to_nalgebra(array: &Array2<Complex64>) -> DMatrix<Complex64> {
    DMatrix::from_fn(array.nrows(), array.ncols(), |row, col| array[[row, col]])
}

fn from_nalgebra(matrix: &DMatrix<Complex64>) -> Array2<Complex64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(row, col)| {
        matrix[(row, col)]
    })
}

/// Conjugate transpose.
fn adjoint(array: &Array2<Complex64>) -> Array2<Complex64> {
    array.t().mapv(|value| value.conj())
}

/// Thin QR factorization.
pub(crate) fn thin_qr(array: &Array2<Complex64>) -> (Array2<Complex64>, Array2<Complex64>) {
    let qr = to_nalgebra(array).qr();
    (from_nalgebra(&qr.q()), from_nalgebra(&qr.r()))
}

/// Truncated SVD with singular values sorted descending.
///
/// Keeps the smallest rank whose discarded squared weight stays below
/// `cutoff * total`, bounded by `maxdim` and at least one.
pub(crate) fn svd_truncated(
    array: &Array2<Complex64>,
    cutoff: f64,
    maxdim: usize,
) -> Result<(Array2<Complex64>, Vec<f64>, Array2<Complex64>), RompsError> {
    let svd = to_nalgebra(array).svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| RompsError::internal("SVD did not produce U"))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| RompsError::internal("SVD did not produce V^T"))?;
    let values = svd.singular_values;
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
    let total: f64 = values.iter().map(|value| value * value).sum();
    let mut keep = order.len();
    if total > 0.0 && cutoff > 0.0 {
        let mut discarded = 0.0;
        while keep > 1 {
            let candidate = values[order[keep - 1]];
            if discarded + candidate * candidate > cutoff * total {
                break;
            }
            discarded += candidate * candidate;
            keep -= 1;
        }
    }
    keep = keep.min(maxdim).max(1);
    let mut u_out = Array2::<Complex64>::zeros((u.nrows(), keep));
    let mut vt_out = Array2::<Complex64>::zeros((keep, v_t.ncols()));
    let mut s_out = Vec::with_capacity(keep);
    for (slot, &index) in order.iter().take(keep).enumerate() {
        s_out.push(values[index]);
        for row in 0..u.nrows() {
            u_out[[row, slot]] = u[(row, index)];
        }
        for col in 0..v_t.ncols() {
            vt_out[[slot, col]] = v_t[(index, col)];
        }
    }
    Ok((u_out, s_out, vt_out))
}
