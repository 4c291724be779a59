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

//! Block-mined fan-out (component 4.E), grounded on the teacher's
//! `SyncPropagator::propagate_blocks` loop-and-continue-on-error pattern: one
//! peer's send failure never stops the round for the rest.

use ethereum_types::U256;
use log::{trace, warn};

use crate::header::Block;
use crate::packet::{NewBlock, NEW_BLOCK_PACKET};
use crate::registry::PeerRegistry;

/// Sends `NEW_BLOCK` to every currently `Active` session. Ordering across
/// peers is unspecified; ordering relative to other outbound traffic to a
/// given peer is FIFO because sends for one peer only ever happen from one
/// place in the registry's single-writer discipline.
pub fn propagate_new_block(registry: &PeerRegistry, block: &Block, total_difficulty: U256) -> usize {
    let payload = NewBlock {
        block: block.clone(),
        total_difficulty,
    }
    .rlp_bytes();

    let mut sent = 0;
    for id in registry.active_ids() {
        let result = registry.with_session_mut(id, |session| session.send(NEW_BLOCK_PACKET, payload.clone()));
        match result {
            Some(Ok(())) => {
                trace!(target: "sync", "sent NEW_BLOCK to peer {}", id);
                sent += 1;
            }
            Some(Err(e)) => {
                warn!(target: "sync", "failed to propagate block to peer {}: {}", id, e);
            }
            None => {}
        }
    }
    sent
}
