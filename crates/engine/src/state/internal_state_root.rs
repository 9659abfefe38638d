//! Deterministic state root
//! SHA3-512 atas encoding canonical seluruh snapshot.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_512};
use std::fmt;

use super::{ContractState, ProposalKind, ProposalStatus};

/// Domain separator, bump jika layout encoding berubah.
const STATE_ROOT_DOMAIN: &[u8] = b"vdao-state-root-v1";

/// SHA3-512 digest dari snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateRoot(pub [u8; 64]);

impl StateRoot {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for StateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for StateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateRoot").field(&self.to_hex()).finish()
    }
}

/* serde: StateRoot sebagai hex string */
impl Serialize for StateRoot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for StateRoot {
    fn deserialize<D>(deserializer: D) -> Result<StateRoot, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid sha3-512 length"))?;
        Ok(StateRoot(arr))
    }
}

/// Append-only byte accumulator dengan length-prefix untuk data variabel.
struct Encoder(Vec<u8>);

impl Encoder {
    fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.u64(b.len() as u64);
        self.0.extend_from_slice(b);
    }

    fn str(&mut self, s: &str) {
        self.bytes(s.as_bytes());
    }

    fn tag(&mut self, t: u8) {
        self.0.push(t);
    }
}

impl ContractState {
    /// Hitung state root.
    ///
    /// Urutan encoding (FIXED): domain, name, ticker, balances, vault,
    /// votes, roles, settings, extensions. Semua map sudah terurut
    /// (`BTreeMap`), jadi snapshot yang sama selalu menghasilkan root yang sama.
    pub fn compute_state_root(&self) -> StateRoot {
        let mut enc = Encoder(Vec::new());
        enc.bytes(STATE_ROOT_DOMAIN);
        enc.str(&self.name);
        enc.str(&self.ticker);

        enc.u64(self.balances.len() as u64);
        for (addr, bal) in &self.balances {
            enc.str(addr.as_str());
            enc.u64(*bal);
        }

        enc.u64(self.vault.len() as u64);
        for (addr, entries) in &self.vault {
            enc.str(addr.as_str());
            enc.u64(entries.len() as u64);
            for e in entries {
                enc.u64(e.balance);
                enc.u64(e.start);
                enc.u64(e.end);
            }
        }

        enc.u64(self.votes.len() as u64);
        for p in &self.votes {
            enc.u64(p.id);
            match &p.kind {
                ProposalKind::Mint { recipient, qty } => {
                    enc.tag(0);
                    enc.str(recipient.as_str());
                    enc.u64(*qty);
                }
                ProposalKind::MintLocked { recipient, qty } => {
                    enc.tag(1);
                    enc.str(recipient.as_str());
                    enc.u64(*qty);
                }
                ProposalKind::Set { key, value, recipient } => {
                    enc.tag(2);
                    enc.str(key);
                    enc.str(&value.to_string());
                    match recipient {
                        Some(r) => {
                            enc.tag(1);
                            enc.str(r.as_str());
                        }
                        None => enc.tag(0),
                    }
                }
                ProposalKind::Indicative => enc.tag(3),
            }
            enc.str(&p.note);
            enc.u64(p.created_at);
            enc.u64(p.total_weight);
            enc.u64(p.yays);
            enc.u64(p.nays);
            enc.u64(p.voted.len() as u64);
            for voter in &p.voted {
                enc.str(voter.as_str());
            }
            enc.tag(match p.status {
                ProposalStatus::Active => 0,
                ProposalStatus::Passed => 1,
                ProposalStatus::Failed => 2,
                ProposalStatus::QuorumFailed => 3,
            });
        }

        enc.u64(self.roles.len() as u64);
        for (addr, role) in &self.roles {
            enc.str(addr.as_str());
            enc.str(role);
        }

        enc.u64(u64::from(self.settings.quorum.bps()));
        enc.u64(self.settings.vote_length);
        enc.u64(self.settings.lock_min_length);
        enc.u64(self.settings.mint_lock_length);

        enc.u64(self.extensions.len() as u64);
        for (key, value) in &self.extensions {
            enc.str(key);
            enc.str(&value.to_string());
        }

        let mut hasher = Sha3_512::new();
        hasher.update(&enc.0);
        StateRoot(hasher.finalize().into())
    }
}
