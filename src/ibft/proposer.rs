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

//! Candidate-block assembly for the proposer role (spec §4.G).

use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use log::debug;
use parity_crypto::publickey::{sign, KeyPair, Message};

use crate::header::{Block, BlockBody, BlockHeader};
use crate::ibft::extra_data::{IbftExtraData, Signature, VANITY_LENGTH};

/// Bounds the next block's gas limit given the parent's. Injected so this
/// crate never needs to know about fork-specific gas-limit parameters
/// (spec §9 "Global state").
pub trait GasLimitPolicy: Send + Sync {
    fn bound(&self, parent_gas_limit: u64) -> u64;
}

/// Keeps the parent's gas limit unchanged; a reasonable default for chains
/// without an elastic gas-limit schedule.
pub struct FixedGasLimitPolicy;

impl GasLimitPolicy for FixedGasLimitPolicy {
    fn bound(&self, parent_gas_limit: u64) -> u64 {
        parent_gas_limit
    }
}

/// Assembles candidate blocks on behalf of a single validator identity.
pub struct Proposer {
    key_pair: KeyPair,
}

impl Proposer {
    pub fn new(key_pair: KeyPair) -> Self {
        Proposer { key_pair }
    }

    pub fn address(&self) -> Address {
        self.key_pair.address()
    }
}

/// Computes `keccak(rlp_encode(header'))` where `header'` carries
/// `extra_data` with the proposer seal stripped — the hash used both to sign
/// and to verify (spec §3, §4.G).
pub fn signature_free_hash(header: &BlockHeader, extra: &IbftExtraData) -> H256 {
    let stripped = extra.without_proposer_seal();
    let header_for_hash = header.with_extra_data(stripped.rlp_bytes());
    keccak(header_for_hash.rlp_bytes())
}

/// Builds a candidate block extending `parent`, with an empty body, an
/// `IbftExtraData` carrying `validators` and no seals, and a proposer
/// signature over the signature-free hash.
pub fn propose(
    proposer: &Proposer,
    parent: &BlockHeader,
    validators: Vec<Address>,
    gas_policy: &dyn GasLimitPolicy,
    timestamp: u64,
) -> Block {
    let unsealed_extra = IbftExtraData::new([0u8; VANITY_LENGTH], validators);
    let gas_limit = gas_policy.bound(parent.gas_limit);

    let header_template = BlockHeader::new(
        parent.hash(),
        H256::zero(),
        proposer.address(),
        H256::zero(),
        H256::zero(),
        H256::zero(),
        Default::default(),
        parent.difficulty,
        parent.number + 1,
        gas_limit,
        0,
        timestamp,
        unsealed_extra.rlp_bytes(),
        H256::zero(),
        0,
    );

    let hash_to_sign = signature_free_hash(&header_template, &unsealed_extra);
    let message = Message::from(hash_to_sign);
    let proposer_seal = match sign(proposer.key_pair.secret(), &message) {
        Ok(sig) => {
            let mut bytes = [0u8; 65];
            bytes.copy_from_slice(&sig[..]);
            Signature(bytes)
        }
        Err(e) => {
            debug!(target: "engine", "failed to produce proposer seal: {}", e);
            Signature::zero()
        }
    };

    let mut sealed_extra = unsealed_extra;
    sealed_extra.proposer_seal = Some(proposer_seal);

    let header = header_template.with_extra_data(sealed_extra.rlp_bytes());

    Block {
        header,
        body: BlockBody::default(),
    }
}
