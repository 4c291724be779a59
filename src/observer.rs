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

//! Blockchain observer bridge (component 4.H), grounded on the teacher's
//! `Client::notify` / `ChainNotify::new_blocks` fan-out in
//! `client/client.rs`: the chain store calls out on every import, and this
//! bridge forwards just the new head as a `NewChainHead` event onto a
//! bounded queue the consensus core drains, rather than replaying the whole
//! `ChainNotify` surface (external to this crate).

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use ethereum_types::U256;
use log::warn;

use crate::header::BlockHeader;

/// Event enqueued for the consensus core on every chain-added notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChainHead {
    pub header: BlockHeader,
}

/// Forwards `ChainAdded` events (spec §6, consumed from the chain store's
/// `watch()` channel) into the consensus event queue as `NewChainHead`.
/// Enqueue is non-blocking: a full queue drops the oldest event, incrementing
/// `dropped_count`, rather than ever stalling the chain-store notifier
/// thread that calls in.
pub struct ObserverBridge {
    sender: Sender<NewChainHead>,
    receiver: Receiver<NewChainHead>,
    dropped_count: AtomicU64,
}

impl ObserverBridge {
    /// `capacity` bounds the consensus event queue (spec §5).
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        ObserverBridge {
            sender,
            receiver,
            dropped_count: AtomicU64::new(0),
        }
    }

    /// The consensus core's read end of the event queue.
    pub fn receiver(&self) -> Receiver<NewChainHead> {
        self.receiver.clone()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Called by the chain store on `ChainAdded(block, receipts, total_difficulty)`;
    /// this crate only needs the header to build `NewChainHead`. Non-blocking:
    /// when the queue is full the oldest pending event is evicted to make
    /// room, per spec §4.H "queue overflow drops the oldest event".
    pub fn on_chain_added(&self, header: BlockHeader, _total_difficulty: U256) {
        let mut event = NewChainHead { header };
        loop {
            match self.sender.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if self.receiver.try_recv().is_ok() {
                        self.dropped_count.fetch_add(1, Ordering::Relaxed);
                    }
                    event = rejected;
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!(target: "engine", "consensus event queue has no receiver; dropping NewChainHead");
                    return;
                }
            }
        }
    }
}
