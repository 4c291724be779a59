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

//! IBFT-legacy attached validation ruleset (spec §4.G, §8 invariant 8).

use derive_more::Display;
use ethereum_types::Address;
use parity_crypto::publickey::{public_to_address, recover, Message, Signature as RecoverableSignature};
use rlp::Rlp;

use crate::header::BlockHeader;
use crate::ibft::extra_data::IbftExtraData;
use crate::ibft::proposer::{signature_free_hash, GasLimitPolicy};

#[derive(Debug, Display)]
pub enum IbftValidationError {
    #[display(fmt = "extra-data does not decode as IbftExtraData: {}", _0)]
    MalformedExtraData(rlp::DecoderError),
    #[display(fmt = "empty validator set")]
    EmptyValidatorSet,
    #[display(fmt = "non-monotonic timestamp")]
    NonMonotonicTimestamp,
    #[display(fmt = "gas limit out of bounds")]
    GasLimitOutOfBounds,
    #[display(fmt = "missing proposer seal")]
    MissingProposerSeal,
    #[display(fmt = "proposer seal does not recover to a known address")]
    UnrecoverableSeal,
    #[display(fmt = "proposer is not a member of the validator set")]
    ProposerNotValidator,
    #[display(fmt = "seals present on an epoch checkpoint block")]
    SealsOnCheckpoint,
}

/// Validates `header` against `parent` under the IBFT-legacy ruleset:
/// validators list non-empty, extra-data round-trips, timestamp monotonic,
/// gas-limit within the injected policy's bound, and the recovered proposer
/// is a member of the embedded validator set. Epoch-boundary blocks
/// (`number % epoch_length == 0`) must carry no seals (the checkpoint
/// convention from spec §4.G).
pub fn validate(
    header: &BlockHeader,
    parent: &BlockHeader,
    gas_policy: &dyn GasLimitPolicy,
    epoch_length: u64,
) -> Result<(), IbftValidationError> {
    let extra = IbftExtraData::decode_rlp(&Rlp::new(&header.extra_data))
        .map_err(IbftValidationError::MalformedExtraData)?;

    if extra.validators.is_empty() {
        return Err(IbftValidationError::EmptyValidatorSet);
    }

    if header.timestamp <= parent.timestamp {
        return Err(IbftValidationError::NonMonotonicTimestamp);
    }

    let bound = gas_policy.bound(parent.gas_limit);
    if header.gas_limit != bound {
        return Err(IbftValidationError::GasLimitOutOfBounds);
    }

    if epoch_length != 0 && header.number % epoch_length == 0 && !extra.seals.is_empty() {
        return Err(IbftValidationError::SealsOnCheckpoint);
    }

    let proposer_seal = extra.proposer_seal.ok_or(IbftValidationError::MissingProposerSeal)?;
    let hash_to_verify = signature_free_hash(header, &extra);
    let message = Message::from(hash_to_verify);
    let recoverable = RecoverableSignature::from(proposer_seal.0);
    let public = recover(&recoverable, &message).map_err(|_| IbftValidationError::UnrecoverableSeal)?;
    let proposer: Address = public_to_address(&public);

    if !extra.validators.contains(&proposer) {
        return Err(IbftValidationError::ProposerNotValidator);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ibft::proposer::{propose, FixedGasLimitPolicy, Proposer};
    use ethereum_types::{Bloom, H256, U256};
    use parity_crypto::publickey::{Generator, Random};

    fn genesis() -> BlockHeader {
        BlockHeader::new(
            H256::zero(),
            H256::zero(),
            ethereum_types::Address::zero(),
            H256::zero(),
            H256::zero(),
            H256::zero(),
            Bloom::zero(),
            U256::from(1),
            0,
            8_000_000,
            0,
            0,
            vec![],
            H256::zero(),
            0,
        )
    }

    #[test]
    fn well_formed_proposal_validates() {
        let key_pair = Random.generate().expect("key generation");
        let proposer = Proposer::new(key_pair);
        let parent = genesis();
        let block = propose(&proposer, &parent, vec![proposer.address()], &FixedGasLimitPolicy, 10);
        assert!(validate(&block.header, &parent, &FixedGasLimitPolicy, 30_000).is_ok());
    }

    #[test]
    fn proposer_outside_validator_set_is_rejected() {
        let key_pair = Random.generate().expect("key generation");
        let proposer = Proposer::new(key_pair);
        let other = Random.generate().expect("key generation");
        let parent = genesis();
        let block = propose(
            &proposer,
            &parent,
            vec![parity_crypto::publickey::KeyPair::from_secret(other.secret().clone()).unwrap().address()],
            &FixedGasLimitPolicy,
            10,
        );
        assert!(matches!(
            validate(&block.header, &parent, &FixedGasLimitPolicy, 30_000),
            Err(IbftValidationError::ProposerNotValidator)
        ));
    }

    #[test]
    fn empty_validator_set_is_rejected() {
        let key_pair = Random.generate().expect("key generation");
        let proposer = Proposer::new(key_pair);
        let parent = genesis();
        let block = propose(&proposer, &parent, vec![], &FixedGasLimitPolicy, 10);
        assert!(matches!(
            validate(&block.header, &parent, &FixedGasLimitPolicy, 30_000),
            Err(IbftValidationError::EmptyValidatorSet)
        ));
    }

    #[test]
    fn non_monotonic_timestamp_is_rejected() {
        let key_pair = Random.generate().expect("key generation");
        let proposer = Proposer::new(key_pair);
        let parent = genesis();
        let block = propose(&proposer, &parent, vec![proposer.address()], &FixedGasLimitPolicy, 0);
        assert!(matches!(
            validate(&block.header, &parent, &FixedGasLimitPolicy, 30_000),
            Err(IbftValidationError::NonMonotonicTimestamp)
        ));
    }
}
