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

//! Wire codec (component 4.B): the seven eth/63 message kinds, their packet
//! ids, and RLP framing. Decoding never panics on malformed input; every
//! `decode` here returns `Result<_, Error>` and releases its backing `Rlp`
//! view on both the success and failure path (it borrows, it never retains).

use ethereum_types::{H256, U256};
use rlp::{Rlp, RlpStream};

use crate::error::Error;
use crate::header::{Block, BlockBody, BlockHeader, Receipt};

pub const STATUS_PACKET: u8 = 0x00;
pub const GET_BLOCK_HEADERS_PACKET: u8 = 0x03;
pub const BLOCK_HEADERS_PACKET: u8 = 0x04;
pub const GET_BLOCK_BODIES_PACKET: u8 = 0x05;
pub const BLOCK_BODIES_PACKET: u8 = 0x06;
pub const NEW_BLOCK_PACKET: u8 = 0x07;
pub const GET_NODE_DATA_PACKET: u8 = 0x0d;
pub const NODE_DATA_PACKET: u8 = 0x0e;
pub const GET_RECEIPTS_PACKET: u8 = 0x0f;
pub const RECEIPTS_PACKET: u8 = 0x10;

/// `STATUS(0x00)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub version: u32,
    pub network_id: u64,
    pub total_difficulty: U256,
    pub head_hash: H256,
    pub genesis_hash: H256,
}

impl Status {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(5);
        s.append(&self.version)
            .append(&self.network_id)
            .append(&self.total_difficulty)
            .append(&self.head_hash)
            .append(&self.genesis_hash);
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        if rlp.item_count()? != 5 {
            return Err(Error::MalformedFrame(rlp::DecoderError::RlpIncorrectListLen));
        }
        Ok(Status {
            version: rlp.val_at(0)?,
            network_id: rlp.val_at(1)?,
            total_difficulty: rlp.val_at(2)?,
            head_hash: rlp.val_at(3)?,
            genesis_hash: rlp.val_at(4)?,
        })
    }
}

/// The starting point of a `GET_BLOCK_HEADERS` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Hash(H256),
    Number(u64),
}

/// `GET_BLOCK_HEADERS(0x03)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetBlockHeaders {
    pub start: BlockId,
    pub max_headers: u32,
    pub skip: u32,
    pub reverse: bool,
}

impl GetBlockHeaders {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(4);
        match self.start {
            BlockId::Hash(h) => {
                s.append(&h);
            }
            BlockId::Number(n) => {
                s.append(&n);
            }
        }
        s.append(&self.max_headers)
            .append(&self.skip)
            .append(&self.reverse);
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        if rlp.item_count()? != 4 {
            return Err(Error::MalformedFrame(rlp::DecoderError::RlpIncorrectListLen));
        }
        let start_rlp = rlp.at(0)?;
        let start = if start_rlp.size() == 32 {
            BlockId::Hash(start_rlp.as_val()?)
        } else {
            BlockId::Number(start_rlp.as_val()?)
        };
        Ok(GetBlockHeaders {
            start,
            max_headers: rlp.val_at(1)?,
            skip: rlp.val_at(2)?,
            reverse: rlp.val_at(3)?,
        })
    }
}

/// `BLOCK_HEADERS(0x04)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockHeaders(pub Vec<BlockHeader>);

impl BlockHeaders {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(self.0.len());
        for header in &self.0 {
            header.rlp_append(&mut s);
        }
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        Ok(BlockHeaders(BlockHeader::decode_rlp_list(rlp)?))
    }
}

/// `GET_BLOCK_BODIES(0x05)` / `GET_RECEIPTS(0x0f)` / `GET_NODE_DATA(0x0d)`:
/// all three request an ordered sequence of hashes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HashList(pub Vec<H256>);

impl HashList {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        rlp::encode_list(&self.0)
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        Ok(HashList(rlp.as_list()?))
    }
}

/// `BLOCK_BODIES(0x06)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockBodies(pub Vec<BlockBody>);

impl BlockBodies {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(self.0.len());
        for body in &self.0 {
            body.rlp_append(&mut s);
        }
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        let bodies = rlp
            .iter()
            .map(|r| BlockBody::decode_rlp(&r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlockBodies(bodies))
    }
}

/// `NEW_BLOCK(0x07)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlock {
    pub block: Block,
    pub total_difficulty: U256,
}

impl NewBlock {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(2);
        self.block.rlp_append(&mut s);
        s.append(&self.total_difficulty);
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        if rlp.item_count()? != 2 {
            return Err(Error::MalformedFrame(rlp::DecoderError::RlpIncorrectListLen));
        }
        Ok(NewBlock {
            block: Block::decode_rlp(&rlp.at(0)?)?,
            total_difficulty: rlp.val_at(1)?,
        })
    }
}

/// `RECEIPTS(0x10)`: one receipt list per requested block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Receipts(pub Vec<Vec<Receipt>>);

impl Receipts {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(self.0.len());
        for per_block in &self.0 {
            s.begin_list(per_block.len());
            for receipt in per_block {
                receipt.rlp_append(&mut s);
            }
        }
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        let mut out = Vec::with_capacity(rlp.item_count()?);
        for per_block in rlp.iter() {
            let mut receipts = Vec::with_capacity(per_block.item_count()?);
            for r in per_block.iter() {
                receipts.push(Receipt::decode_rlp(&r)?);
            }
            out.push(receipts);
        }
        Ok(Receipts(out))
    }
}

/// `NODE_DATA(0x0e)`: raw trie node bytes, one entry per resolved hash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeData(pub Vec<Vec<u8>>);

impl NodeData {
    pub fn rlp_bytes(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(self.0.len());
        for entry in &self.0 {
            s.append(entry);
        }
        s.out()
    }

    pub fn decode(rlp: &Rlp) -> Result<Self, Error> {
        Ok(NodeData(rlp.as_list()?))
    }
}
