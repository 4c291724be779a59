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

//! Shared error and disconnect-reason taxonomy (component I).

use derive_more::Display;
use rlp::DecoderError;

/// Reasons a session can be torn down, shared by the session driver, the eth
/// server and the downloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    BreachOfProtocol,
    UselessPeer,
    TooManyPeers,
    AlreadyConnected,
    IncompatibleProtocol,
    NullNodeIdentity,
    ClientQuit,
    UnexpectedIdentity,
    RemoteConnectionReset,
    SubprotocolTriggered,
}

impl DisconnectReason {
    /// Wire value sent to the remote peer before the transport is closed,
    /// per the canonical RLPx disconnect-reason numbering. `RemoteConnectionReset`
    /// isn't a standard RLPx reason — it's reused here as the local marker
    /// for "the transport is already gone", so it is never actually put on
    /// the wire; it reuses TCPError's 0x01 rather than colliding with a
    /// reason that is sent.
    pub fn wire_code(&self) -> u8 {
        match *self {
            DisconnectReason::RemoteConnectionReset => 0x01,
            DisconnectReason::BreachOfProtocol => 0x02,
            DisconnectReason::UselessPeer => 0x03,
            DisconnectReason::TooManyPeers => 0x04,
            DisconnectReason::AlreadyConnected => 0x05,
            DisconnectReason::IncompatibleProtocol => 0x06,
            DisconnectReason::NullNodeIdentity => 0x07,
            DisconnectReason::ClientQuit => 0x08,
            DisconnectReason::UnexpectedIdentity => 0x09,
            DisconnectReason::SubprotocolTriggered => 0x10,
        }
    }
}

/// Closed error taxonomy for this crate (spec §7).
#[derive(Debug, Display)]
pub enum Error {
    /// RLP structure or field widths violate the wire schema.
    #[display(fmt = "malformed frame: {}", _0)]
    MalformedFrame(DecoderError),
    /// Peer's STATUS did not match our network id / genesis hash.
    #[display(fmt = "incompatible status")]
    IncompatibleStatus,
    /// A send failed because the peer is no longer reachable.
    #[display(fmt = "peer gone")]
    PeerGone,
    /// An outstanding request timed out.
    #[display(fmt = "request timeout")]
    RequestTimeout,
    /// Parent-hash linkage between two headers did not hold.
    #[display(fmt = "header linkage violation")]
    LinkageViolation,
    /// Downloader exhausted its retry budget.
    #[display(fmt = "max retries reached")]
    MaxRetriesReached,
    /// Task was cancelled cooperatively.
    #[display(fmt = "cancelled")]
    Cancelled,
    /// An external storage collaborator was not available to answer a query.
    #[display(fmt = "storage unavailable")]
    StorageUnavailable,
}

impl std::error::Error for Error {}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Self {
        Error::MalformedFrame(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_wire_codes_are_distinct() {
        let reasons = [
            DisconnectReason::BreachOfProtocol,
            DisconnectReason::UselessPeer,
            DisconnectReason::TooManyPeers,
            DisconnectReason::AlreadyConnected,
            DisconnectReason::IncompatibleProtocol,
            DisconnectReason::NullNodeIdentity,
            DisconnectReason::ClientQuit,
            DisconnectReason::UnexpectedIdentity,
            DisconnectReason::RemoteConnectionReset,
            DisconnectReason::SubprotocolTriggered,
        ];
        let mut codes: Vec<u8> = reasons.iter().map(|r| r.wire_code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), reasons.len());
    }

    #[test]
    fn decoder_error_maps_to_malformed_frame() {
        let err: Error = DecoderError::RlpIsTooShort.into();
        assert!(matches!(err, Error::MalformedFrame(_)));
    }
}
