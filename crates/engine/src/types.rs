//! Primitive types: Address, amount bounds, block context, and the pure
//! validators every handler goes through before touching state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ContractError;

/// Largest integer every replaying implementation can represent exactly
/// (2^53 - 1). Semua amount, height, dan lock length dibatasi nilai ini.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Panjang address (base64url tanpa padding dari 32-byte digest).
pub const ADDRESS_LEN: usize = 43;

// ════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ════════════════════════════════════════════════════════════════════════════

/// Account identifier: 43 karakter base64url (`A-Z a-z 0-9 _ -`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Parse + validate. `InvalidAddress` jika tidak well-formed.
    pub fn parse(s: &str) -> Result<Self, ContractError> {
        if is_valid_address(s) {
            Ok(Address(s.to_string()))
        } else {
            Err(ContractError::InvalidAddress(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Pure predicate: `s` adalah account identifier yang well-formed.
pub fn is_valid_address(s: &str) -> bool {
    s.len() == ADDRESS_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.0).finish()
    }
}

impl FromStr for Address {
    type Err = ContractError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

/* --- serde: Address sebagai plain string, divalidasi saat decode --- */
impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BLOCK CONTEXT
// ════════════════════════════════════════════════════════════════════════════

/// Read-only context yang di-inject oleh collaborator eksternal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Current block height (monotonically non-decreasing antar call)
    pub height: u64,
}

impl BlockContext {
    pub fn at(height: u64) -> Self {
        Self { height }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VALIDATORS
// ════════════════════════════════════════════════════════════════════════════

/// Quantity dari wire → amount. `InvalidAmount` jika <= 0 atau > bound.
pub fn validate_amount(qty: i64) -> Result<u64, ContractError> {
    if qty <= 0 || qty as u64 > MAX_SAFE_INTEGER {
        return Err(ContractError::InvalidAmount);
    }
    Ok(qty as u64)
}

/// Lock length dari wire. Di bawah `min` → `LockTooShort`; di atas bound →
/// `InvalidAmount`.
pub fn validate_lock_length(length: i64, min: u64) -> Result<u64, ContractError> {
    if length < 0 || (length as u64) < min {
        return Err(ContractError::LockTooShort { min, got: length });
    }
    if length as u64 > MAX_SAFE_INTEGER {
        return Err(ContractError::InvalidAmount);
    }
    Ok(length as u64)
}

/// `height + length`, dijaga tetap di dalam safe-integer bound.
pub fn end_height(height: u64, length: u64) -> Result<u64, ContractError> {
    height
        .checked_add(length)
        .filter(|end| *end <= MAX_SAFE_INTEGER)
        .ok_or(ContractError::InvalidAmount)
}

/// `a + b` di dalam safe-integer bound.
pub fn safe_add(a: u64, b: u64) -> Result<u64, ContractError> {
    a.checked_add(b)
        .filter(|sum| *sum <= MAX_SAFE_INTEGER)
        .ok_or(ContractError::InvalidAmount)
}

/// Target harus berbeda dari caller.
pub fn ensure_not_self(caller: &Address, target: &Address) -> Result<(), ContractError> {
    if caller == target {
        return Err(ContractError::SelfTransfer);
    }
    Ok(())
}
