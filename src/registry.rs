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

//! Peer registry (spec §5): single-writer/many-reader map from `PeerId` to
//! its session, shared by the server, the notifier and the downloader's peer
//! selection. The session driver is the sole writer; everyone else only
//! needs a snapshot-consistent read or a momentary write to mutate a single
//! session's own state (e.g. a send failure moving it to `Disconnected`).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::session::{PeerId, PeerSession};

#[derive(Default)]
pub struct PeerRegistry {
    sessions: RwLock<HashMap<PeerId, PeerSession>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        PeerRegistry::default()
    }

    pub fn insert(&self, session: PeerSession) {
        self.sessions.write().insert(session.id(), session);
    }

    pub fn remove(&self, id: PeerId) -> Option<PeerSession> {
        self.sessions.write().remove(&id)
    }

    pub fn ids(&self) -> Vec<PeerId> {
        self.sessions.read().keys().copied().collect()
    }

    pub fn active_ids(&self) -> Vec<PeerId> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.id())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with exclusive access to a single session, if present. Used
    /// for both dispatch (one handler in-flight per session, spec §5) and
    /// sends that may mutate session state on failure.
    pub fn with_session_mut<R>(&self, id: PeerId, f: impl FnOnce(&mut PeerSession) -> R) -> Option<R> {
        self.sessions.write().get_mut(&id).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DisconnectReason;
    use ethereum_types::H256;

    #[test]
    fn tracks_active_sessions_only() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut s1 = PeerSession::new(1, 1, H256::zero(), tx);
        s1.disconnect(DisconnectReason::ClientQuit);
        registry.insert(s1);

        let (tx2, _rx2) = crossbeam_channel::unbounded();
        registry.insert(PeerSession::new(2, 1, H256::zero(), tx2));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_ids(), Vec::<PeerId>::new());
    }

    #[test]
    fn with_session_mut_reaches_the_right_session() {
        let registry = PeerRegistry::new();
        let (tx, _rx) = crossbeam_channel::unbounded();
        registry.insert(PeerSession::new(7, 1, H256::zero(), tx));
        let id = registry.with_session_mut(7, |s| s.id());
        assert_eq!(id, Some(7));
        assert_eq!(registry.with_session_mut(99, |s| s.id()), None);
    }
}
