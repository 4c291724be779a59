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

//! Config scaffold (component 4.J): the options spec §6 lists as consumed by
//! this crate. Loading from a CLI or file is an external collaborator's job
//! (`oe`'s argument parsing, in the teacher); this module only carries the
//! already-resolved values, the same way [`crate::server::RequestLimits`]
//! carries its single field.

/// Top-level options this crate consumes (spec §6).
#[derive(Debug, Clone)]
pub struct Config {
    /// The local network id; peers with a different value fail the STATUS gate.
    pub network_id: u64,
    pub max_items_per_response: u16,
    pub downloader_parallelism: u16,
    pub request_timeout_ms: u32,
    pub max_retries: u16,
    pub fast_sync: bool,
    pub ibft: IbftConfig,
}

impl Config {
    /// `network_id` has no sane default (spec §6 marks it required); every
    /// other field falls back to [`Config::default`]'s values.
    pub fn new(network_id: u64) -> Self {
        Config {
            network_id,
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network_id: 1,
            max_items_per_response: 192,
            downloader_parallelism: 4,
            request_timeout_ms: 8_000,
            max_retries: 3,
            fast_sync: false,
            ibft: IbftConfig::default(),
        }
    }
}

/// IBFT-legacy-specific options, nested under `ibft.*` (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct IbftConfig {
    pub epoch_length: u64,
    pub request_timeout_ms: u32,
}

impl Default for IbftConfig {
    fn default() -> Self {
        IbftConfig {
            epoch_length: 30_000,
            request_timeout_ms: 8_000,
        }
    }
}

impl From<&Config> for crate::server::RequestLimits {
    fn from(config: &Config) -> Self {
        crate::server::RequestLimits {
            max_items_per_response: config.max_items_per_response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.max_items_per_response, 192);
        assert_eq!(config.downloader_parallelism, 4);
        assert_eq!(config.request_timeout_ms, 8_000);
        assert_eq!(config.max_retries, 3);
        assert!(!config.fast_sync);
    }

    #[test]
    fn new_overrides_only_network_id() {
        let config = Config::new(42);
        assert_eq!(config.network_id, 42);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn request_limits_derive_from_config() {
        let config = Config::new(1);
        let limits: crate::server::RequestLimits = (&config).into();
        assert_eq!(limits.max_items_per_response, 192);
    }
}
