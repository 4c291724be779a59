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

//! `IbftExtraData` wire layout and the vanity/seal split used to compute the
//! signature-free header hash, after Clique's `sig_hash` construction (the
//! closest PoA-family analog in this ecosystem: both strip a trailing
//! signature from `extra_data` before hashing the header for signing).

use ethereum_types::Address;
use parity_bytes::Bytes;
use rlp::{DecoderError, Rlp, RlpStream};

pub const VANITY_LENGTH: usize = 32;
const SIGNATURE_LENGTH: usize = 65;

/// A 65-byte recoverable ECDSA signature (r, s, v), round-tripped as raw
/// bytes on the wire. Actual signing/recovery is performed through
/// `parity_crypto::publickey`; this type only carries the bytes through RLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    pub fn zero() -> Self {
        Signature([0u8; SIGNATURE_LENGTH])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature::zero()
    }
}

/// Validator-set and proposer-seal payload embedded in `header.extra_data`
/// for IBFT-legacy blocks (spec §3, §4.G).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbftExtraData {
    pub vanity: [u8; VANITY_LENGTH],
    pub validators: Vec<Address>,
    pub seals: Vec<Signature>,
    pub proposer_seal: Option<Signature>,
}

impl IbftExtraData {
    pub fn new(vanity: [u8; VANITY_LENGTH], validators: Vec<Address>) -> Self {
        IbftExtraData {
            vanity,
            validators,
            seals: Vec::new(),
            proposer_seal: None,
        }
    }

    pub fn rlp_bytes(&self) -> Bytes {
        let mut s = RlpStream::new_list(4);
        s.append(&&self.vanity[..]);
        s.append_list(&self.validators);
        s.begin_list(self.seals.len());
        for seal in &self.seals {
            s.append(&&seal.0[..]);
        }
        match &self.proposer_seal {
            Some(sig) => {
                s.append(&&sig.0[..]);
            }
            None => {
                s.append_empty_data();
            }
        }
        s.out()
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let vanity_bytes: Vec<u8> = rlp.val_at(0)?;
        if vanity_bytes.len() != VANITY_LENGTH {
            return Err(DecoderError::RlpInvalidLength);
        }
        let mut vanity = [0u8; VANITY_LENGTH];
        vanity.copy_from_slice(&vanity_bytes);

        let validators: Vec<Address> = rlp.list_at(1)?;

        let seals_rlp = rlp.at(2)?;
        let mut seals = Vec::with_capacity(seals_rlp.item_count()?);
        for seal in seals_rlp.iter() {
            seals.push(decode_signature(&seal)?);
        }

        let proposer_rlp = rlp.at(3)?;
        let proposer_seal = if proposer_rlp.is_empty() {
            None
        } else {
            Some(decode_signature(&proposer_rlp)?)
        };

        Ok(IbftExtraData {
            vanity,
            validators,
            seals,
            proposer_seal,
        })
    }

    /// `extra_data` with the proposer seal stripped, used to derive the
    /// signature-free header hash (both for signing and for verifying).
    pub fn without_proposer_seal(&self) -> Self {
        IbftExtraData {
            vanity: self.vanity,
            validators: self.validators.clone(),
            seals: self.seals.clone(),
            proposer_seal: None,
        }
    }
}

fn decode_signature(rlp: &Rlp) -> Result<Signature, DecoderError> {
    let bytes: Vec<u8> = rlp.as_val()?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(DecoderError::RlpInvalidLength);
    }
    let mut out = [0u8; SIGNATURE_LENGTH];
    out.copy_from_slice(&bytes);
    Ok(Signature(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_seals_and_proposer() {
        let mut extra = IbftExtraData::new([7u8; VANITY_LENGTH], vec![Address::random(), Address::random()]);
        extra.seals.push(Signature([1u8; SIGNATURE_LENGTH]));
        extra.proposer_seal = Some(Signature([2u8; SIGNATURE_LENGTH]));

        let bytes = extra.rlp_bytes();
        let decoded = IbftExtraData::decode_rlp(&Rlp::new(&bytes)).unwrap();
        assert_eq!(extra, decoded);
    }

    #[test]
    fn empty_proposer_seal_round_trips_to_none() {
        let extra = IbftExtraData::new([0u8; VANITY_LENGTH], vec![Address::random()]);
        let decoded = IbftExtraData::decode_rlp(&Rlp::new(&extra.rlp_bytes())).unwrap();
        assert_eq!(decoded.proposer_seal, None);
    }

    #[test]
    fn without_proposer_seal_drops_only_the_seal() {
        let mut extra = IbftExtraData::new([3u8; VANITY_LENGTH], vec![Address::random()]);
        extra.proposer_seal = Some(Signature([9u8; SIGNATURE_LENGTH]));
        let stripped = extra.without_proposer_seal();
        assert_eq!(stripped.proposer_seal, None);
        assert_eq!(stripped.validators, extra.validators);
    }
}
