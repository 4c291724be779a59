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

//! Eth server (component 4.D): turns an incoming request frame into a
//! response by reading from the chain model, under bounded, partial-tolerant
//! rules. No handler here ever blocks the calling worker past a chain-model
//! read; network sends are left to the caller via the returned payload.

use ethereum_types::H256;
use log::debug;

use crate::chain::ChainReadModel;
use crate::error::Error;
use crate::header::BlockHeader;
use crate::packet::{BlockId, GetBlockHeaders, HashList};

/// Uniform response-size ceiling applied to headers, bodies, receipts and
/// node-data entries alike (spec §3 `RequestLimits`).
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    pub max_items_per_response: u16,
}

impl Default for RequestLimits {
    fn default() -> Self {
        RequestLimits {
            max_items_per_response: 192,
        }
    }
}

/// Resolution source for `GET_NODE_DATA`, external to the chain model proper
/// because state-trie node storage is a distinct collaborator (spec §9 open
/// question (i)). A production node wires a real source; tests and
/// archive-less configurations opt into [`NodeDataSource::unsupported`]
/// explicitly rather than silently answering empty by default.
pub trait NodeDataSource: Send + Sync {
    fn node_data(&self, hash: &H256) -> Option<Vec<u8>>;
}

/// Explicit "no state-trie collaborator wired up" marker. Distinguishes
/// `StorageUnavailable` from "collaborator present but missing this key",
/// which is silently skipped like bodies/receipts.
pub struct UnsupportedNodeData;

impl NodeDataSource for UnsupportedNodeData {
    fn node_data(&self, _hash: &H256) -> Option<Vec<u8>> {
        None
    }
}

/// Dispatches eth/63 requests against a chain read model.
pub struct EthServer<C> {
    chain: C,
    limits: RequestLimits,
}

impl<C: ChainReadModel> EthServer<C> {
    pub fn new(chain: C, limits: RequestLimits) -> Self {
        EthServer { chain, limits }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// `GET_BLOCK_HEADERS` (invariants 1-2, scenarios S1-S5).
    pub fn get_block_headers(&self, request: &GetBlockHeaders) -> Vec<BlockHeader> {
        let start_number = match request.start {
            BlockId::Number(n) => n,
            BlockId::Hash(h) => match self.chain.header_by_hash(&h) {
                Some(header) => header.number,
                None => return Vec::new(),
            },
        };

        let limit = std::cmp::min(request.max_headers as u64, self.limits.max_items_per_response as u64);
        let stride: i128 = (request.skip as i128 + 1) * if request.reverse { -1 } else { 1 };

        let mut out = Vec::new();
        let mut number: i128 = start_number as i128;
        for _ in 0..limit {
            if number < 0 {
                break;
            }
            let header = match self.chain.header_by_number(number as u64) {
                Some(h) => h,
                None => break,
            };
            out.push(header);
            number += stride;
        }
        out
    }

    /// `GET_BLOCK_BODIES` (invariant 3, scenario S7). Absent hashes are
    /// skipped silently, never represented as a gap marker.
    pub fn get_block_bodies(&self, request: &HashList) -> Vec<crate::header::BlockBody> {
        request
            .0
            .iter()
            .take(self.limits.max_items_per_response as usize)
            .filter_map(|h| self.chain.body_by_hash(h))
            .collect()
    }

    /// `GET_RECEIPTS`: same absent-skip discipline as bodies.
    pub fn get_receipts(&self, request: &HashList) -> Vec<Vec<crate::header::Receipt>> {
        request
            .0
            .iter()
            .take(self.limits.max_items_per_response as usize)
            .filter_map(|h| self.chain.receipts_by_hash(h))
            .collect()
    }

    /// `GET_NODE_DATA`. When `source` reports unavailable we still answer
    /// with an empty sequence (never a protocol error) but the caller of
    /// this method is expected to have already decided, via `source`,
    /// whether that emptiness means "unsupported" or "not skipped".
    pub fn get_node_data(&self, request: &HashList, source: &dyn NodeDataSource) -> Vec<Vec<u8>> {
        request
            .0
            .iter()
            .take(self.limits.max_items_per_response as usize)
            .filter_map(|h| source.node_data(h))
            .collect()
    }

    /// Maps a decode/session error surfaced while handling a request to the
    /// disconnect action the session driver must take (spec §4.D last
    /// paragraph): malformed frames and explicit subprotocol failures close
    /// the session; a gone peer is a silent no-op.
    pub fn on_dispatch_error(&self, err: &Error) -> Option<crate::error::DisconnectReason> {
        match err {
            Error::MalformedFrame(_) => Some(crate::error::DisconnectReason::BreachOfProtocol),
            Error::StorageUnavailable => Some(crate::error::DisconnectReason::SubprotocolTriggered),
            Error::PeerGone => {
                debug!(target: "sync", "dispatch skipped: peer gone");
                None
            }
            _ => None,
        }
    }
}
