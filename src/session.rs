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

//! Per-connection state machine (component 4.C).
//!
//! A `PeerSession` never holds a back-pointer to the server or the registry
//! that owns it (spec note "cyclic references" — one-way references only):
//! it identifies itself by `id()` and talks to the outside world purely
//! through the outbound mailbox it was constructed with.

use crossbeam_channel::Sender;
use ethereum_types::{H256, U256};
use log::{debug, trace};

use crate::error::{DisconnectReason, Error};
use crate::packet::{Status, STATUS_PACKET};

pub type PeerId = usize;

/// A `(name, version)` sub-protocol capability, as advertised during the
/// devp2p handshake external to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability {
    pub name: String,
    pub version: u8,
}

impl Capability {
    pub fn new(name: &str, version: u8) -> Self {
        Capability {
            name: name.to_string(),
            version,
        }
    }
}

/// Capabilities this node offers, highest-preferred first.
fn local_capabilities() -> Vec<Capability> {
    vec![Capability::new("istanbul", 64), Capability::new("eth", 63)]
}

/// Picks the highest mutually supported capability out of this node's
/// offered set and the peer's advertised set. `None` means no overlap, which
/// callers must treat as `Disconnected(IncompatibleProtocol)`.
pub fn negotiate_capability(peer_capabilities: &[Capability]) -> Option<Capability> {
    local_capabilities()
        .into_iter()
        .find(|local| peer_capabilities.contains(local))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Opened,
    StatusSent,
    StatusReceived,
    Active,
    Disconnected(DisconnectReason),
}

/// Everything learned about the remote side during the handshake.
#[derive(Debug, Clone, Default)]
pub struct PeerStatus {
    pub network_id: u64,
    pub genesis_hash: H256,
    pub total_difficulty: U256,
    pub head_hash: H256,
}

/// Per-peer session state machine plus its outbound mailbox. One instance
/// lives for the lifetime of a single transport connection.
pub struct PeerSession {
    id: PeerId,
    state: SessionState,
    local_network_id: u64,
    local_genesis_hash: H256,
    capabilities: Vec<Capability>,
    chosen_protocol: Option<Capability>,
    peer_status: Option<PeerStatus>,
    outbound: Sender<(u8, Vec<u8>)>,
}

impl PeerSession {
    pub fn new(
        id: PeerId,
        local_network_id: u64,
        local_genesis_hash: H256,
        outbound: Sender<(u8, Vec<u8>)>,
    ) -> Self {
        PeerSession {
            id,
            state: SessionState::Opened,
            local_network_id,
            local_genesis_hash,
            capabilities: Vec::new(),
            chosen_protocol: None,
            peer_status: None,
            outbound,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active)
    }

    pub fn peer_status(&self) -> Option<&PeerStatus> {
        self.peer_status.as_ref()
    }

    pub fn chosen_protocol(&self) -> Option<&Capability> {
        self.chosen_protocol.as_ref()
    }

    /// Send our own `STATUS`. Per the ordering guarantee (spec §5(ii)) this
    /// must be the first outbound message on a fresh session.
    pub fn send_status(&mut self, total_difficulty: U256, head_hash: H256) -> Result<(), Error> {
        let status = Status {
            version: 63,
            network_id: self.local_network_id,
            total_difficulty,
            head_hash,
            genesis_hash: self.local_genesis_hash,
        };
        self.send_raw(STATUS_PACKET, status.rlp_bytes())?;
        self.state = SessionState::StatusSent;
        Ok(())
    }

    /// Capability advertisement, external to the eth sub-protocol proper but
    /// required before a `STATUS` frame can be meaningfully accepted.
    pub fn set_peer_capabilities(&mut self, capabilities: Vec<Capability>) {
        self.capabilities = capabilities;
    }

    /// Handle the first inbound frame. Anything other than `STATUS` here is a
    /// protocol breach (invariant 4). A `STATUS` with mismatched network id or
    /// genesis hash is also a breach (invariant 5), never a softer reason.
    pub fn on_frame(&mut self, packet_id: u8, status: Option<Status>) {
        match &self.state {
            SessionState::Disconnected(_) => {}
            SessionState::Active => {
                trace!(target: "sync", "peer {} dispatching packet {:#x}", self.id, packet_id);
            }
            _ => {
                if packet_id != STATUS_PACKET {
                    debug!(target: "sync", "peer {} sent {:#x} before STATUS", self.id, packet_id);
                    self.disconnect(DisconnectReason::BreachOfProtocol);
                    return;
                }
                let status = match status {
                    Some(s) => s,
                    None => {
                        self.disconnect(DisconnectReason::BreachOfProtocol);
                        return;
                    }
                };
                self.accept_status(status);
            }
        }
    }

    fn accept_status(&mut self, status: Status) {
        self.state = SessionState::StatusReceived;
        if status.network_id != self.local_network_id || status.genesis_hash != self.local_genesis_hash {
            debug!(target: "sync", "peer {} failed status gate: network_id={} genesis={:?}",
                self.id, status.network_id, status.genesis_hash);
            self.disconnect(DisconnectReason::BreachOfProtocol);
            return;
        }
        let chosen = match negotiate_capability(&self.capabilities) {
            Some(c) => c,
            None => {
                self.disconnect(DisconnectReason::IncompatibleProtocol);
                return;
            }
        };
        self.chosen_protocol = Some(chosen);
        self.peer_status = Some(PeerStatus {
            network_id: status.network_id,
            genesis_hash: status.genesis_hash,
            total_difficulty: status.total_difficulty,
            head_hash: status.head_hash,
        });
        self.state = SessionState::Active;
    }

    /// Update the peer's advertised head/total-difficulty, as learned from a
    /// later `NEW_BLOCK` or `NEW_BLOCK_HASHES` (outside this crate's codec).
    pub fn update_peer_head(&mut self, head_hash: H256, total_difficulty: U256) {
        if let Some(status) = self.peer_status.as_mut() {
            status.head_hash = head_hash;
            status.total_difficulty = total_difficulty;
        }
    }

    /// Send a packet while `Active`. A write failure is surfaced as
    /// `PeerGone` and moves the session to `Disconnected(RemoteConnectionReset)`.
    pub fn send(&mut self, packet_id: u8, payload: Vec<u8>) -> Result<(), Error> {
        if !self.is_active() {
            return Err(Error::PeerGone);
        }
        self.send_raw(packet_id, payload)
    }

    fn send_raw(&mut self, packet_id: u8, payload: Vec<u8>) -> Result<(), Error> {
        match self.outbound.send((packet_id, payload)) {
            Ok(()) => Ok(()),
            Err(_) => {
                self.state = SessionState::Disconnected(DisconnectReason::RemoteConnectionReset);
                Err(Error::PeerGone)
            }
        }
    }

    /// Idempotent: repeated calls are no-ops once disconnected.
    pub fn disconnect(&mut self, reason: DisconnectReason) {
        if matches!(self.state, SessionState::Disconnected(_)) {
            return;
        }
        debug!(target: "sync", "disconnecting peer {}: {:?}", self.id, reason);
        self.state = SessionState::Disconnected(reason);
    }
}
