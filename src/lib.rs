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

//! Eth sub-protocol server, header-sequence downloader and IBFT-legacy
//! proposer glue: the wire-facing and block-download core of a full
//! Ethereum node, minus EVM execution, the trie/storage engine, the
//! transaction pool, JSON-RPC, CLI/config loading and the IBFT consensus
//! state machine proper — all of those are external collaborators this
//! crate only talks to through narrow interfaces.

pub mod chain;
pub mod config;
pub mod downloader;
pub mod error;
pub mod header;
pub mod ibft;
pub mod notifier;
pub mod observer;
pub mod packet;
pub mod registry;
pub mod server;
pub mod session;

pub use chain::{BlockStatus, ChainHead, ChainReadModel};
pub use config::{Config, IbftConfig};
pub use downloader::{HeaderDownloadTask, HeaderTransport};
pub use error::{DisconnectReason, Error};
pub use header::{Block, BlockBody, BlockHeader, BlockNumber, Receipt, Transaction};
pub use notifier::propagate_new_block;
pub use observer::{NewChainHead, ObserverBridge};
pub use registry::PeerRegistry;
pub use server::{EthServer, NodeDataSource, RequestLimits, UnsupportedNodeData};
pub use session::{Capability, PeerId, PeerSession, PeerStatus, SessionState};
