//! Whitelist contract interface.
//!
//! Calls are typed through the `sol!` declaration below. The JSON ABI is the artifact a
//! frontend ships with; the binding checks it against the declared calls before use.

use alloy_json_abi::JsonAbi;
use alloy_sol_types::{sol, SolCall};

use crate::error::{Error, Result};

sol! {
    contract Whitelist {
        constructor(uint8 _maxWhitelistedAddresses);

        /// Add the sender. Reverts when already whitelisted or when the list is full.
        function addAddress() external;

        function maxWhitelistedAddresses() external view returns (uint8);

        function whitelistedCount() external view returns (uint8);

        function whitelisted(address account) external view returns (bool);
    }
}

/// ABI of the deployed whitelist contract.
pub const WHITELIST_ABI: &str = r#"[
  {
    "type": "constructor",
    "inputs": [{ "name": "_maxWhitelistedAddresses", "type": "uint8", "internalType": "uint8" }],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "addAddress",
    "inputs": [],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "maxWhitelistedAddresses",
    "inputs": [],
    "outputs": [{ "name": "", "type": "uint8", "internalType": "uint8" }],
    "stateMutability": "view"
  },
  {
    "type": "function",
    "name": "whitelistedCount",
    "inputs": [],
    "outputs": [{ "name": "", "type": "uint8", "internalType": "uint8" }],
    "stateMutability": "view"
  },
  {
    "type": "function",
    "name": "whitelisted",
    "inputs": [{ "name": "", "type": "address", "internalType": "address" }],
    "outputs": [{ "name": "", "type": "bool", "internalType": "bool" }],
    "stateMutability": "view"
  }
]"#;

/// A parsed contract ABI.
#[derive(Debug, Clone)]
pub struct Abi {
    json: JsonAbi,
}

impl Abi {
    pub fn parse(json: &str) -> Result<Self> { Ok(Self { json: serde_json::from_str(json)? }) }

    pub fn whitelist() -> Result<Self> { Self::parse(WHITELIST_ABI) }

    pub fn json(&self) -> &JsonAbi { &self.json }

    /// Fails unless the ABI has a function with `C`'s selector.
    pub fn require<C: SolCall>(&self) -> Result<()> {
        if self.json.functions().any(|f| f.selector().0 == C::SELECTOR) {
            Ok(())
        } else {
            Err(Error::MissingAbiEntry(C::SIGNATURE.to_string()))
        }
    }

    /// Fails unless the constructor takes exactly the capacity argument.
    pub fn require_constructor(&self) -> Result<()> {
        match self.json.constructor() {
            Some(ctor) if ctor.inputs.iter().map(|p| p.ty.as_str()).eq(["uint8"]) => Ok(()),
            _ => Err(Error::MissingAbiEntry("constructor(uint8)".into())),
        }
    }

    /// Every call the whitelist binding makes.
    pub fn require_whitelist(&self) -> Result<()> {
        self.require::<Whitelist::addAddressCall>()?;
        self.require::<Whitelist::whitelistedCountCall>()?;
        self.require::<Whitelist::maxWhitelistedAddressesCall>()?;
        self.require::<Whitelist::whitelistedCall>()
    }
}
