//! State-patch guard for `set` proposals
//!
//! Raw `(key, value, recipient)` dari proposal diubah menjadi [`PatchTarget`]
//! yang sudah tervalidasi. Validasi dijalankan saat propose; saat finalize
//! patch tinggal diterapkan.

use serde_json::Value;

use crate::error::ContractError;
use crate::types::{Address, MAX_SAFE_INTEGER};
use super::{ContractState, QuorumFraction};

/// Key yang tidak pernah boleh di-patch langsung.
pub const PROTECTED_KEYS: [&str; 6] = ["balances", "vault", "votes", "roles", "settings", "extensions"];

pub const KEY_QUORUM: &str = "quorum";
pub const KEY_VOTE_LENGTH: &str = "voteLength";
pub const KEY_LOCK_MIN_LENGTH: &str = "lockMinLength";
pub const KEY_MINT_LOCK_LENGTH: &str = "mintLockLength";
pub const KEY_NAME: &str = "name";
pub const KEY_TICKER: &str = "ticker";
pub const KEY_ROLE: &str = "role";

/// Patch yang sudah lolos guard.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchTarget {
    Quorum(QuorumFraction),
    VoteLength(u64),
    LockMinLength(u64),
    MintLockLength(u64),
    Name(String),
    Ticker(String),
    Role { recipient: Address, label: String },
    /// Custom key, disimpan verbatim di `extensions`
    Extension { key: String, value: Value },
}

pub fn is_protected(key: &str) -> bool {
    PROTECTED_KEYS.contains(&key)
}

impl PatchTarget {
    /// Validasi raw proposal `set`.
    ///
    /// # Langkah (URUT)
    ///
    /// 1. Key wajib ada dan tidak kosong (`InvalidSetting`)
    /// 2. Key tidak termasuk `PROTECTED_KEYS` (`ProtectedKey`)
    /// 3. Value wajib ada (`InvalidSetting`)
    /// 4. Shape value sesuai key (`InvalidSetting`, `InvalidAddress` untuk role)
    pub fn validate(
        key: Option<&str>,
        value: Option<&Value>,
        recipient: Option<&str>,
    ) -> Result<PatchTarget, ContractError> {
        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => return Err(ContractError::invalid_setting("", "a set proposal needs a key")),
        };
        if is_protected(key) {
            return Err(ContractError::ProtectedKey(key.to_string()));
        }
        let value = value
            .ok_or_else(|| ContractError::invalid_setting(key, "a set proposal needs a value"))?;

        let target = match key {
            KEY_QUORUM => PatchTarget::Quorum(parse_quorum(value)?),
            KEY_VOTE_LENGTH => PatchTarget::VoteLength(parse_block_count(key, value)?),
            KEY_LOCK_MIN_LENGTH => PatchTarget::LockMinLength(parse_block_count(key, value)?),
            KEY_MINT_LOCK_LENGTH => PatchTarget::MintLockLength(parse_block_count(key, value)?),
            KEY_NAME => PatchTarget::Name(parse_label(key, value)?),
            KEY_TICKER => PatchTarget::Ticker(parse_label(key, value)?),
            KEY_ROLE => {
                let recipient = Address::parse(recipient.unwrap_or_default())?;
                PatchTarget::Role { recipient, label: parse_label(key, value)? }
            }
            other => PatchTarget::Extension { key: other.to_string(), value: value.clone() },
        };
        Ok(target)
    }
}

fn parse_quorum(value: &Value) -> Result<QuorumFraction, ContractError> {
    match value {
        Value::Number(n) => QuorumFraction::parse_decimal(&n.to_string()),
        Value::String(s) => QuorumFraction::parse_decimal(s),
        _ => Err(ContractError::invalid_setting(KEY_QUORUM, "expected a decimal between 0 and 1")),
    }
}

fn parse_block_count(key: &str, value: &Value) -> Result<u64, ContractError> {
    match value.as_u64() {
        Some(n) if n >= 1 && n <= MAX_SAFE_INTEGER => Ok(n),
        _ => Err(ContractError::invalid_setting(key, "expected a positive block count")),
    }
}

fn parse_label(key: &str, value: &Value) -> Result<String, ContractError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ContractError::invalid_setting(key, "expected a string"))
}

impl ContractState {
    /// Terapkan patch yang sudah tervalidasi. Tidak bisa gagal.
    pub(crate) fn apply_patch(&mut self, target: PatchTarget) {
        match target {
            PatchTarget::Quorum(q) => self.settings.quorum = q,
            PatchTarget::VoteLength(n) => self.settings.vote_length = n,
            PatchTarget::LockMinLength(n) => self.settings.lock_min_length = n,
            PatchTarget::MintLockLength(n) => self.settings.mint_lock_length = n,
            PatchTarget::Name(name) => self.name = name,
            PatchTarget::Ticker(ticker) => self.ticker = ticker,
            PatchTarget::Role { recipient, label } => {
                self.roles.insert(recipient, label);
            }
            PatchTarget::Extension { key, value } => {
                self.extensions.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADMIN: &str = "uhE-QeYS8i4pmUtnxQyHD7dzXFNaJ9oMK-IM-QPNY6M";

    #[test]
    fn test_protected_keys_rejected() {
        for key in PROTECTED_KEYS {
            assert_eq!(
                PatchTarget::validate(Some(key), Some(&json!(["random"])), None),
                Err(ContractError::ProtectedKey(key.to_string()))
            );
        }
    }

    #[test]
    fn test_typed_keys() {
        assert_eq!(
            PatchTarget::validate(Some("quorum"), Some(&json!(0.3)), None),
            Ok(PatchTarget::Quorum(QuorumFraction::from_bps(3000).unwrap()))
        );
        assert_eq!(
            PatchTarget::validate(Some("quorum"), Some(&json!("0.25")), None),
            Ok(PatchTarget::Quorum(QuorumFraction::from_bps(2500).unwrap()))
        );
        assert_eq!(
            PatchTarget::validate(Some("voteLength"), Some(&json!(10)), None),
            Ok(PatchTarget::VoteLength(10))
        );
        assert_eq!(
            PatchTarget::validate(Some("ticker"), Some(&json!("VDAO")), None),
            Ok(PatchTarget::Ticker("VDAO".to_string()))
        );
    }

    #[test]
    fn test_typed_keys_wrong_shape() {
        let cases = [
            ("quorum", json!(1.5)),
            ("quorum", json!(0)),
            ("quorum", json!(true)),
            ("voteLength", json!(0)),
            ("voteLength", json!(-3)),
            ("lockMinLength", json!("five")),
            ("mintLockLength", json!(2.5)),
            ("name", json!(42)),
        ];
        for (key, value) in cases {
            let err = PatchTarget::validate(Some(key), Some(&value), None).unwrap_err();
            assert!(
                matches!(err, ContractError::InvalidSetting { .. }),
                "{} = {} gave {:?}",
                key,
                value,
                err
            );
        }
        assert!(matches!(
            PatchTarget::validate(None, Some(&json!(1)), None),
            Err(ContractError::InvalidSetting { .. })
        ));
        assert!(matches!(
            PatchTarget::validate(Some("voteLength"), None, None),
            Err(ContractError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_role_needs_recipient() {
        assert_eq!(
            PatchTarget::validate(Some("role"), Some(&json!("MAIN")), None),
            Err(ContractError::InvalidAddress(String::new()))
        );
        let target = PatchTarget::validate(Some("role"), Some(&json!("MAIN")), Some(ADMIN)).unwrap();
        assert_eq!(
            target,
            PatchTarget::Role {
                recipient: Address::parse(ADMIN).unwrap(),
                label: "MAIN".to_string()
            }
        );
    }

    #[test]
    fn test_apply_patch() {
        let mut state = ContractState::default();
        let custom = PatchTarget::validate(Some("customKey"), Some(&json!(["custom", "value"])), None)
            .unwrap();
        state.apply_patch(custom);
        state.apply_patch(PatchTarget::LockMinLength(7));
        state.apply_patch(PatchTarget::Role {
            recipient: Address::parse(ADMIN).unwrap(),
            label: "MAIN".to_string(),
        });
        assert_eq!(state.extensions["customKey"], json!(["custom", "value"]));
        assert_eq!(state.settings.lock_min_length, 7);
        assert_eq!(state.roles[&Address::parse(ADMIN).unwrap()], "MAIN");
    }
}
