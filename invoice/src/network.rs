// Modern, minimalistic & standard-compliant cold wallet library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::str::FromStr;

/// Mainnet (bitcoin) pubkey address prefix.
pub const PUBKEY_ADDRESS_PREFIX_MAIN: u8 = 0; // 0x00
/// Mainnet (bitcoin) script address prefix.
pub const SCRIPT_ADDRESS_PREFIX_MAIN: u8 = 5; // 0x05
/// Test (tesnet, signet, regtest) pubkey address prefix.
pub const PUBKEY_ADDRESS_PREFIX_TEST: u8 = 111; // 0x6f
/// Test (tesnet, signet, regtest) script address prefix.
pub const SCRIPT_ADDRESS_PREFIX_TEST: u8 = 196; // 0xc4

/// Bitcoin network used by the address
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum Network {
    /// Bitcoin mainnet
    #[display("bitcoin")]
    Mainnet,

    /// Bitcoin testnet3
    Testnet3,

    /// Bitcoin testnet4
    Testnet4,

    /// Bitcoin signet
    Signet,

    /// Bitcoin regtest networks
    Regtest,
}

impl Network {
    /// Detects whether the network is a kind of test network (testnet, signet,
    /// regtest).
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    /// Address encoding parameters used by the network.
    pub fn address_network(self) -> AddressNetwork { AddressNetwork::from(self) }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown bitcoin network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bitcoin" | "mainnet" => Network::Mainnet,
            "testnet" | "testnet3" => Network::Testnet3,
            "testnet4" => Network::Testnet4,
            "signet" => Network::Signet,
            "regtest" => Network::Regtest,
            other => return Err(UnknownNetwork(other.to_owned())),
        })
    }
}

/// Address encoding parameters, which are shared between networks: testnets and signet use
/// the same prefixes, while regtest differs from them only by the bech32 human-readable part.
///
/// Script and transaction logic never depends on it; the value is passed explicitly to every
/// address derivation and is produced by address parsing.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum AddressNetwork {
    /// Bitcoin mainnet
    Mainnet,

    /// Bitcoin testnet and signet
    Testnet,

    /// Bitcoin regtest networks
    Regtest,
}

impl From<Network> for AddressNetwork {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => AddressNetwork::Mainnet,
            Network::Testnet3 | Network::Testnet4 | Network::Signet => AddressNetwork::Testnet,
            Network::Regtest => AddressNetwork::Regtest,
        }
    }
}

impl AddressNetwork {
    /// Detects whether the network is a kind of test network (testnet, signet,
    /// regtest).
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    pub fn pubkey_prefix(self) -> u8 {
        match self {
            AddressNetwork::Mainnet => PUBKEY_ADDRESS_PREFIX_MAIN,
            AddressNetwork::Testnet | AddressNetwork::Regtest => PUBKEY_ADDRESS_PREFIX_TEST,
        }
    }

    pub fn script_prefix(self) -> u8 {
        match self {
            AddressNetwork::Mainnet => SCRIPT_ADDRESS_PREFIX_MAIN,
            AddressNetwork::Testnet | AddressNetwork::Regtest => SCRIPT_ADDRESS_PREFIX_TEST,
        }
    }

    pub fn bech32_hrp(self) -> &'static str {
        match self {
            AddressNetwork::Mainnet => "bc",
            AddressNetwork::Testnet => "tb",
            AddressNetwork::Regtest => "bcrt",
        }
    }

    /// Detects network from a (lowercase) bech32 human-readable part.
    pub fn from_bech32_hrp(hrp: &str) -> Option<Self> {
        match hrp {
            "bc" => Some(AddressNetwork::Mainnet),
            "tb" => Some(AddressNetwork::Testnet),
            "bcrt" => Some(AddressNetwork::Regtest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn networks() {
        for network in ["bitcoin", "testnet3", "testnet4", "signet", "regtest"] {
            assert_eq!(Network::from_str(network).unwrap().to_string(), network);
        }
        assert_eq!(Network::from_str("mainnet"), Ok(Network::Mainnet));
        assert_eq!(Network::from_str("liquid"), Err(UnknownNetwork(s!("liquid"))));
        assert!(!Network::Mainnet.is_testnet());
        assert_eq!(Network::Signet.address_network(), AddressNetwork::Testnet);
        assert_eq!(Network::Regtest.address_network().bech32_hrp(), "bcrt");
        assert_eq!(AddressNetwork::Regtest.pubkey_prefix(), PUBKEY_ADDRESS_PREFIX_TEST);
        assert_eq!(AddressNetwork::from_bech32_hrp("tb"), Some(AddressNetwork::Testnet));
    }
}
