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

//! Block header and body (component 3, data model).

use ethereum_types::{Address, Bloom, H256, U256};
use keccak_hash::keccak;
use parity_bytes::Bytes;
use rlp::{DecoderError, Rlp, RlpStream};

pub type BlockNumber = u64;

/// Canonical Ethereum block header, restricted to the fields this core needs
/// to round-trip the wire encoding and validate linkage/IBFT rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub parent_hash: H256,
    pub uncles_hash: H256,
    pub coinbase: Address,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub log_bloom: Bloom,
    pub difficulty: U256,
    pub number: BlockNumber,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub mix_hash: H256,
    pub nonce: u64,
    hash: H256,
}

impl BlockHeader {
    /// Build a header from its fields, computing and memoizing its hash.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parent_hash: H256,
        uncles_hash: H256,
        coinbase: Address,
        state_root: H256,
        transactions_root: H256,
        receipts_root: H256,
        log_bloom: Bloom,
        difficulty: U256,
        number: BlockNumber,
        gas_limit: u64,
        gas_used: u64,
        timestamp: u64,
        extra_data: Bytes,
        mix_hash: H256,
        nonce: u64,
    ) -> Self {
        let mut header = BlockHeader {
            parent_hash,
            uncles_hash,
            coinbase,
            state_root,
            transactions_root,
            receipts_root,
            log_bloom,
            difficulty,
            number,
            gas_limit,
            gas_used,
            timestamp,
            extra_data,
            mix_hash,
            nonce,
            hash: H256::zero(),
        };
        header.hash = header.compute_hash();
        header
    }

    /// keccak(rlp_encode(header)) under the standard (non-IBFT) hash function.
    pub fn compute_hash(&self) -> H256 {
        keccak(self.rlp_bytes())
    }

    /// Memoized block hash; callers that mutate `extra_data` after construction
    /// (the IBFT proposer glue does, to attach the proposer seal) must rebuild
    /// via [`BlockHeader::new`] or [`BlockHeader::with_extra_data`] rather than
    /// poke the field directly, so this stays correct.
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// Rebuild this header with a different `extra_data`, recomputing the hash.
    pub fn with_extra_data(&self, extra_data: Bytes) -> Self {
        BlockHeader::new(
            self.parent_hash,
            self.uncles_hash,
            self.coinbase,
            self.state_root,
            self.transactions_root,
            self.receipts_root,
            self.log_bloom,
            self.difficulty,
            self.number,
            self.gas_limit,
            self.gas_used,
            self.timestamp,
            extra_data,
            self.mix_hash,
            self.nonce,
        )
    }

    pub fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(15);
        s.append(&self.parent_hash);
        s.append(&self.uncles_hash);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.log_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
        s.append(&self.mix_hash);
        s.append(&self.nonce);
    }

    pub fn rlp_bytes(&self) -> Bytes {
        let mut s = RlpStream::new();
        self.rlp_append(&mut s);
        s.out()
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 15 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(BlockHeader::new(
            rlp.val_at(0)?,
            rlp.val_at(1)?,
            rlp.val_at(2)?,
            rlp.val_at(3)?,
            rlp.val_at(4)?,
            rlp.val_at(5)?,
            rlp.val_at(6)?,
            rlp.val_at(7)?,
            rlp.val_at(8)?,
            rlp.val_at(9)?,
            rlp.val_at(10)?,
            rlp.val_at(11)?,
            rlp.val_at(12)?,
            rlp.val_at(13)?,
            rlp.val_at(14)?,
        ))
    }

    pub fn decode_rlp_list(rlp: &Rlp) -> Result<Vec<Self>, DecoderError> {
        rlp.iter().map(|r| BlockHeader::decode_rlp(&r)).collect()
    }
}

/// A minimal signed transaction, sufficient to round-trip `BlockBody` on the
/// wire. Transaction pool semantics (validation, replacement, scoring) are an
/// external collaborator; this crate only needs to carry transactions through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    pub fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(9);
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        match self.to {
            Some(ref addr) => s.append(addr),
            None => s.append_empty_data(),
        };
        s.append(&self.value);
        s.append(&self.data);
        s.append(&self.v);
        s.append(&self.r);
        s.append(&self.s);
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let to = if rlp.at(3)?.is_empty() {
            None
        } else {
            Some(rlp.val_at(3)?)
        };
        Ok(Transaction {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas: rlp.val_at(2)?,
            to,
            value: rlp.val_at(4)?,
            data: rlp.val_at(5)?,
            v: rlp.val_at(6)?,
            r: rlp.val_at(7)?,
            s: rlp.val_at(8)?,
        })
    }

    pub fn decode_rlp_list(rlp: &Rlp) -> Result<Vec<Self>, DecoderError> {
        rlp.iter().map(|r| Transaction::decode_rlp(&r)).collect()
    }
}

/// Body of a block: ordered transactions and ommer headers (structural
/// equality, per the data model).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub ommers: Vec<BlockHeader>,
}

impl BlockBody {
    pub fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.begin_list(self.transactions.len());
        for tx in &self.transactions {
            tx.rlp_append(s);
        }
        s.begin_list(self.ommers.len());
        for ommer in &self.ommers {
            ommer.rlp_append(s);
        }
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(BlockBody {
            transactions: Transaction::decode_rlp_list(&rlp.at(0)?)?,
            ommers: BlockHeader::decode_rlp_list(&rlp.at(1)?)?,
        })
    }
}

/// A full block: header plus body, as exchanged by `NEW_BLOCK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        self.header.rlp_append(s);
        s.begin_list(self.body.transactions.len());
        for tx in &self.body.transactions {
            tx.rlp_append(s);
        }
        s.begin_list(self.body.ommers.len());
        for ommer in &self.body.ommers {
            ommer.rlp_append(s);
        }
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Block {
            header: BlockHeader::decode_rlp(&rlp.at(0)?)?,
            body: BlockBody {
                transactions: Transaction::decode_rlp_list(&rlp.at(1)?)?,
                ommers: BlockHeader::decode_rlp_list(&rlp.at(2)?)?,
            },
        })
    }
}

/// A single transaction receipt, opaque beyond what `GET_RECEIPTS` needs to
/// carry (execution semantics live in the EVM collaborator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub status: bool,
    pub gas_used: u64,
    pub log_bloom: Bloom,
    pub logs_rlp: Bytes,
}

impl Receipt {
    pub fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(4);
        s.append(&self.status);
        s.append(&self.gas_used);
        s.append(&self.log_bloom);
        s.append_raw(&self.logs_rlp, 1);
    }

    pub fn decode_rlp(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 4 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Receipt {
            status: rlp.val_at(0)?,
            gas_used: rlp.val_at(1)?,
            log_bloom: rlp.val_at(2)?,
            logs_rlp: rlp.at(3)?.as_raw().to_vec(),
        })
    }
}
