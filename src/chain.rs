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

//! Chain read model (component 4.A): a read-only, non-blocking, snapshot
//! projection over the block store. The store itself (RocksDB et al.) is an
//! external collaborator; this module only defines the surface consumed by
//! the eth server, the downloader, the notifier and the IBFT glue, plus an
//! in-memory implementation used by tests across the crate.

use std::collections::HashMap;

use ethereum_types::{H256, U256};
use parking_lot::RwLock;

use crate::header::{BlockBody, BlockHeader, BlockNumber, Receipt};

/// Status of a block hash against the local chain, used to short-circuit
/// downloader work on data we already have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    InChain,
    Queued,
    Bad,
    Unknown,
}

/// `(hash, header, total_difficulty)` of the canonical chain head.
#[derive(Debug, Clone)]
pub struct ChainHead {
    pub hash: H256,
    pub header: BlockHeader,
    pub total_difficulty: U256,
}

/// Read-only surface of the chain store (spec §4.A). Every query is
/// non-blocking from the caller's perspective and consistent with a single
/// snapshot; absent entries return `None`, never an error.
pub trait ChainReadModel: Send + Sync {
    fn header_by_hash(&self, hash: &H256) -> Option<BlockHeader>;
    fn header_by_number(&self, number: BlockNumber) -> Option<BlockHeader>;
    fn body_by_hash(&self, hash: &H256) -> Option<BlockBody>;
    fn receipts_by_hash(&self, hash: &H256) -> Option<Vec<Receipt>>;
    fn chain_head(&self) -> ChainHead;
    fn genesis_hash(&self) -> H256;

    /// Convenience used by the eth server and the downloader to avoid
    /// re-deriving linkage results for data already known locally.
    fn block_status(&self, hash: &H256) -> BlockStatus {
        if self.header_by_hash(hash).is_some() {
            BlockStatus::InChain
        } else {
            BlockStatus::Unknown
        }
    }

    fn total_difficulty_by_hash(&self, hash: &H256) -> Option<U256> {
        let header = self.header_by_hash(hash)?;
        if header.number == 0 {
            return Some(header.difficulty);
        }
        // A faithful implementation accumulates this from storage; the
        // in-memory fixture below tracks it directly per block.
        None
    }
}

/// An in-memory chain fixture, modeled on the teacher's
/// `TestBlockChainClient`: used by every component's unit tests and by the
/// `tests/scenarios.rs` integration suite. Not part of the production
/// collaborator surface.
#[derive(Default)]
pub struct TestChain {
    inner: RwLock<TestChainState>,
}

#[derive(Default)]
struct TestChainState {
    by_hash: HashMap<H256, BlockHeader>,
    by_number: HashMap<BlockNumber, H256>,
    bodies: HashMap<H256, BlockBody>,
    receipts: HashMap<H256, Vec<Receipt>>,
    total_difficulty: HashMap<H256, U256>,
    genesis_hash: H256,
    head: H256,
}

impl TestChain {
    pub fn new() -> Self {
        TestChain::default()
    }

    /// Append `count` blocks on top of the current head, starting from
    /// genesis if the chain is empty. Returns the hashes of the new blocks in
    /// ascending order.
    pub fn add_blocks(&self, count: usize) -> Vec<H256> {
        let mut state = self.inner.write();
        let mut hashes = Vec::with_capacity(count);
        let (mut parent_hash, mut number, mut parent_td) = if state.by_number.is_empty() {
            (H256::zero(), 0u64, U256::zero())
        } else {
            let head = state.head;
            let header = state.by_hash[&head].clone();
            (
                head,
                header.number + 1,
                state.total_difficulty[&head],
            )
        };
        for _ in 0..count {
            let header = BlockHeader::new(
                parent_hash,
                ethereum_types::H256::zero(),
                ethereum_types::Address::zero(),
                ethereum_types::H256::zero(),
                ethereum_types::H256::zero(),
                ethereum_types::H256::zero(),
                ethereum_types::Bloom::zero(),
                U256::from(number) + 1,
                number,
                8_000_000,
                0,
                1_000_000 + number,
                vec![],
                H256::zero(),
                0,
            );
            let hash = header.hash();
            let td = parent_td + header.difficulty;
            if number == 0 {
                state.genesis_hash = hash;
            }
            state.by_hash.insert(hash, header.clone());
            state.by_number.insert(number, hash);
            state.bodies.insert(hash, BlockBody::default());
            state.total_difficulty.insert(hash, td);
            state.head = hash;
            hashes.push(hash);
            parent_hash = hash;
            parent_td = td;
            number += 1;
        }
        hashes
    }

    pub fn set_receipts(&self, hash: H256, receipts: Vec<Receipt>) {
        self.inner.write().receipts.insert(hash, receipts);
    }

    pub fn hash_of(&self, number: BlockNumber) -> Option<H256> {
        self.inner.read().by_number.get(&number).copied()
    }
}

impl ChainReadModel for TestChain {
    fn header_by_hash(&self, hash: &H256) -> Option<BlockHeader> {
        self.inner.read().by_hash.get(hash).cloned()
    }

    fn header_by_number(&self, number: BlockNumber) -> Option<BlockHeader> {
        let state = self.inner.read();
        let hash = state.by_number.get(&number)?;
        state.by_hash.get(hash).cloned()
    }

    fn body_by_hash(&self, hash: &H256) -> Option<BlockBody> {
        self.inner.read().bodies.get(hash).cloned()
    }

    fn receipts_by_hash(&self, hash: &H256) -> Option<Vec<Receipt>> {
        self.inner.read().receipts.get(hash).cloned()
    }

    fn chain_head(&self) -> ChainHead {
        let state = self.inner.read();
        let header = state.by_hash[&state.head].clone();
        ChainHead {
            hash: state.head,
            header,
            total_difficulty: state.total_difficulty[&state.head],
        }
    }

    fn genesis_hash(&self) -> H256 {
        self.inner.read().genesis_hash
    }

    fn total_difficulty_by_hash(&self, hash: &H256) -> Option<U256> {
        self.inner.read().total_difficulty.get(hash).copied()
    }
}
