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

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

//! # romps
//!
//! `Rust-only Matrix Product Simulator` - the matrix-product-state toolkit for monitored
//! quantum circuits by HQS Quantum Simulations.
//!
//! romps simulates one-dimensional monitored quantum circuits on truncated
//! matrix-product-state (MPS) representations. It provides deterministic unitary gates,
//! projective measurements with Born-rule sampling, symbolic circuits that expand
//! deterministically under a seed, and an executor that keeps random-number consumption
//! byte-identical between symbolic expansion and live trajectories.

use thiserror::Error;

/// romps version information, used for romps import/export checks.
pub const ROMPS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that can occur in romps.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum RompsError {
    /// Error when a caller-provided value is outside the domain of the operation.
    ///
    /// Raised for bad boundary-condition/length combinations, malformed product-state
    /// specifications, support/site-count mismatches, out-of-range geometry positions,
    /// probability lists summing above one and similar input problems.
    #[error("Invalid argument: {msg}")]
    InvalidArgument {
        /// Description of the rejected input.
        msg: String,
    },
    /// Error when a requested combination is valid input but not implemented.
    ///
    /// Raised for unknown site types and for composite gates on local dimensions the
    /// engine does not measure.
    #[error("Unsupported operation: {msg}")]
    Unsupported {
        /// Description of the unsupported combination.
        msg: String,
    },
    /// Error when a Born measurement finds no probability mass to sample from.
    ///
    /// The total probability over all permitted outcomes fell below 1e-14, so the state
    /// has no support in the measured sectors.
    #[error("Numerical failure: {msg}")]
    NumericalFailure {
        /// Description of the degenerate numerical situation.
        msg: String,
    },
    /// Error signalling an inconsistency inside the engine rather than bad user input.
    ///
    /// Raised when operator site indices do not match the state the operator is applied
    /// to. Indicates a bug in gate construction.
    #[error("Internal error: {msg}")]
    Internal {
        /// Description of the inconsistency.
        msg: String,
    },
}

impl RompsError {
    /// Creates an [RompsError::InvalidArgument] from anything displayable.
    pub fn invalid_argument(msg: impl std::fmt::Display) -> Self {
        Self::InvalidArgument {
            msg: msg.to_string(),
        }
    }

    /// Creates an [RompsError::Unsupported] from anything displayable.
    pub fn unsupported(msg: impl std::fmt::Display) -> Self {
        Self::Unsupported {
            msg: msg.to_string(),
        }
    }

    /// Creates an [RompsError::NumericalFailure] from anything displayable.
    pub fn numerical(msg: impl std::fmt::Display) -> Self {
        Self::NumericalFailure {
            msg: msg.to_string(),
        }
    }

    /// Creates an [RompsError::Internal] from anything displayable.
    pub fn internal(msg: impl std::fmt::Display) -> Self {
        Self::Internal {
            msg: msg.to_string(),
        }
    }
}

pub mod apply;
pub mod basis;
#[doc(hidden)]
mod circuit;
pub use circuit::*;
pub mod execute;
pub mod expand;
pub mod geometry;
pub mod mps;
pub mod observables;
pub mod operations;
pub mod prelude;
pub mod rng;
pub mod state;
