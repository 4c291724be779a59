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

//! End-to-end coverage of spec scenarios S1-S8, run against the in-memory
//! chain fixture and a scripted downloader transport, the same fixtures used
//! by the per-component unit tests but exercised here as whole request/
//! response round-trips rather than single-method calls.

use ethereum_types::{H256, U256};
use eth_core::chain::{ChainReadModel, TestChain};
use eth_core::downloader::{HeaderDownloadTask, HeaderTransport};
use eth_core::error::Error;
use eth_core::header::{Block, BlockBody, BlockHeader};
use eth_core::notifier::propagate_new_block;
use eth_core::packet::{BlockId, GetBlockHeaders, HashList};
use eth_core::registry::PeerRegistry;
use eth_core::server::{EthServer, RequestLimits};
use eth_core::session::{Capability, PeerSession};

fn init() {
    let _ = env_logger::try_init();
}

fn server_with_chain(blocks: usize) -> (EthServer<TestChain>, Vec<H256>) {
    let chain = TestChain::new();
    let hashes = chain.add_blocks(blocks);
    (EthServer::new(chain, RequestLimits::default()), hashes)
}

#[test]
fn s1_forward_range() {
    init();
    let (server, _) = server_with_chain(21);
    let req = GetBlockHeaders {
        start: BlockId::Number(5),
        max_headers: 5,
        skip: 0,
        reverse: false,
    };
    let numbers: Vec<u64> = server.get_block_headers(&req).iter().map(|h| h.number).collect();
    assert_eq!(numbers, vec![5, 6, 7, 8, 9]);
}

#[test]
fn s2_request_limit_clamp() {
    init();
    let chain = TestChain::new();
    chain.add_blocks(21);
    let server = EthServer::new(
        chain,
        RequestLimits {
            max_items_per_response: 5,
        },
    );
    let req = GetBlockHeaders {
        start: BlockId::Number(5),
        max_headers: 10,
        skip: 0,
        reverse: false,
    };
    let numbers: Vec<u64> = server.get_block_headers(&req).iter().map(|h| h.number).collect();
    assert_eq!(numbers, vec![5, 6, 7, 8, 9]);
}

#[test]
fn s3_reversed_with_skip() {
    init();
    let (server, _) = server_with_chain(21);
    let req = GetBlockHeaders {
        start: BlockId::Number(10),
        max_headers: 5,
        skip: 1,
        reverse: true,
    };
    let numbers: Vec<u64> = server.get_block_headers(&req).iter().map(|h| h.number).collect();
    assert_eq!(numbers, vec![10, 8, 6, 4, 2]);
}

#[test]
fn s4_partial_at_tip() {
    init();
    let (server, hashes) = server_with_chain(10);
    let tip = hashes.len() as u64 - 1;
    let req = GetBlockHeaders {
        start: BlockId::Number(tip - 1),
        max_headers: 5,
        skip: 0,
        reverse: false,
    };
    let numbers: Vec<u64> = server.get_block_headers(&req).iter().map(|h| h.number).collect();
    assert_eq!(numbers, vec![tip - 1, tip]);
}

#[test]
fn s5_below_genesis_truncation() {
    init();
    let (server, _) = server_with_chain(3);
    let req = GetBlockHeaders {
        start: BlockId::Number(1),
        max_headers: 13,
        skip: 0,
        reverse: true,
    };
    let numbers: Vec<u64> = server.get_block_headers(&req).iter().map(|h| h.number).collect();
    assert_eq!(numbers, vec![1, 0]);
}

struct FlakyTransport {
    reference_only: Vec<BlockHeader>,
}

impl HeaderTransport for FlakyTransport {
    fn request_headers(&self, _peer: eth_core::session::PeerId, _request: &GetBlockHeaders) -> Result<Vec<BlockHeader>, Error> {
        Ok(self.reference_only.clone())
    }
}

#[test]
fn s6_downloader_fails_with_reference_only_response() {
    init();
    let chain = TestChain::new();
    chain.add_blocks(20);
    let reference = chain.header_by_number(15).unwrap();
    let transport = FlakyTransport {
        reference_only: vec![reference.clone()],
    };
    let mut task = HeaderDownloadTask::new(reference, 5, 3, 1);
    let err = task.run(&transport, &[1]).unwrap_err();
    assert!(matches!(err, Error::MaxRetriesReached));
}

#[test]
fn s7_bodies_partial() {
    init();
    let (server, hashes) = server_with_chain(3);
    let known = hashes[1];
    let req = HashList(vec![H256::random(), known, H256::random()]);
    let bodies = server.get_block_bodies(&req);
    assert_eq!(bodies.len(), 1);
}

fn active_session(id: eth_core::session::PeerId) -> (PeerSession, crossbeam_channel::Receiver<(u8, Vec<u8>)>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut session = PeerSession::new(id, 1, H256::zero(), tx);
    session.set_peer_capabilities(vec![Capability::new("eth", 63)]);
    let status = eth_core::packet::Status {
        version: 63,
        network_id: 1,
        total_difficulty: U256::zero(),
        head_hash: H256::zero(),
        genesis_hash: H256::zero(),
    };
    session.on_frame(eth_core::packet::STATUS_PACKET, Some(status));
    assert!(session.is_active());
    (session, rx)
}

#[test]
fn s8_new_block_fan_out_reaches_every_peer() {
    init();
    let registry = PeerRegistry::new();
    let mut receivers = Vec::new();
    for id in 0..5 {
        let (session, rx) = active_session(id);
        registry.insert(session);
        receivers.push(rx);
    }

    let block = Block {
        header: BlockHeader::new(
            H256::zero(),
            H256::zero(),
            ethereum_types::Address::zero(),
            H256::zero(),
            H256::zero(),
            H256::zero(),
            Default::default(),
            U256::from(1),
            1,
            8_000_000,
            0,
            1,
            vec![],
            H256::zero(),
            0,
        ),
        body: BlockBody::default(),
    };

    let sent = propagate_new_block(&registry, &block, U256::from(4242));
    assert_eq!(sent, 5);

    for rx in receivers {
        let (packet_id, payload) = rx.try_recv().expect("every active peer gets NEW_BLOCK");
        assert_eq!(packet_id, eth_core::packet::NEW_BLOCK_PACKET);
        let decoded = eth_core::packet::NewBlock::decode(&rlp::Rlp::new(&payload)).unwrap();
        assert_eq!(decoded.total_difficulty, U256::from(4242));
    }
}
