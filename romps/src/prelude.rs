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

//! Prelude re-exporting the types needed to build and run monitored circuits.

pub use crate::apply::{apply, apply_to_sites, apply_with_prob, measure_site, reset_site};
pub use crate::basis::{BasisMap, BoundaryCondition};
pub use crate::execute::{simulate, RecordWhen, RecordingContext};
pub use crate::expand::{expand_circuit, ExpandedOp};
pub use crate::geometry::{Direction, Geometry, Parity};
pub use crate::observables::{list_observables, Observable};
pub use crate::operations::{Gate, MeasurementBasis};
pub use crate::rng::{RngRegistry, StreamName};
pub use crate::state::{InitSpec, ProductStatePattern, SimulationState, SiteType};
pub use crate::{Circuit, CircuitBuilder, CircuitOperation, Outcome, RompsError};
