// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of OpenEthereum.

// OpenEthereum is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// OpenEthereum is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with OpenEthereum.  If not, see <http://www.gnu.org/licenses/>.

//! IBFT-legacy proposer glue (component 4.G): block candidate assembly,
//! signature-free hashing and the attached validation ruleset. The IBFT
//! consensus state machine itself (round changes, commit quorum, view
//! changes) is an external collaborator; this module only builds and checks
//! the header a proposer hands to it.

pub mod extra_data;
pub mod proposer;
pub mod validation;

pub use extra_data::{IbftExtraData, Signature};
pub use proposer::{propose, GasLimitPolicy, Proposer};
pub use validation::{validate, IbftValidationError};
