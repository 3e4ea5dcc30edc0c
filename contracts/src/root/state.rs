//! # Root State
//!
//! The singleton record a root persists between calls, and its versioned
//! byte encoding.
//!
//! ```text
//! StateRecord { version: u16, state: RootState }   (bincode)
//! ```
//!
//! Encoding the same state twice yields the same bytes. An upgrade that
//! only swaps the executable logic therefore reproduces the record exactly.

use serde::{Deserialize, Serialize};
use tip3_protocol::config::STATE_RECORD_VERSION;
use tip3_protocol::{Address, OwnerCredential, RootData, TokenMetadata, VerifiedTemplate};

use super::error::RootError;
use super::funding::FundingState;
use super::ledger::SupplyLedger;

/// Collaborator references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Funding provider and batch submitter.
    pub checker: Address,
    /// Notified of redemption burns.
    pub receiver: Address,
    /// Predecessor root allowed to replay migrated grants.
    pub old_root: Option<Address>,
    /// Successor root burned tokens migrate to.
    pub new_root: Option<Address>,
    /// DAO contract allowed to mint through trusted grants.
    pub trusted: Option<Address>,
    /// Opaque external-chain token identifier.
    pub eth_root: [u8; 32],
}

/// Everything a root remembers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    pub(crate) metadata: TokenMetadata,
    pub(crate) owner: OwnerCredential,
    pub(crate) ledger: SupplyLedger,
    pub(crate) wallet_template: Option<VerifiedTemplate>,
    pub(crate) topology: Topology,
    pub(crate) funding: FundingState,
}

impl RootState {
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn owner(&self) -> &OwnerCredential {
        &self.owner
    }

    pub fn ledger(&self) -> &SupplyLedger {
        &self.ledger
    }

    pub fn wallet_template(&self) -> Option<&VerifiedTemplate> {
        self.wallet_template.as_ref()
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn funding(&self) -> &FundingState {
        &self.funding
    }

    /// Payload identifying this token to collaborators.
    pub fn root_data(&self) -> RootData {
        RootData::new(&self.metadata, self.topology.eth_root)
    }

    /// Encodes the versioned state record.
    pub fn to_record(&self) -> Result<Vec<u8>, RootError> {
        let record = StateRecordRef {
            version: STATE_RECORD_VERSION,
            state: self,
        };
        bincode::serialize(&record).map_err(|e| RootError::Record(e.to_string()))
    }

    /// Decodes a state record written by [`RootState::to_record`].
    ///
    /// # Errors
    ///
    /// [`RootError::Record`] for malformed bytes or a version this build
    /// does not understand.
    pub fn from_record(bytes: &[u8]) -> Result<Self, RootError> {
        let record: StateRecord =
            bincode::deserialize(bytes).map_err(|e| RootError::Record(e.to_string()))?;
        if record.version != STATE_RECORD_VERSION {
            return Err(RootError::Record(format!(
                "unsupported record version {}",
                record.version
            )));
        }
        record.state.ledger.check_invariant()?;
        Ok(record.state)
    }
}

#[derive(Serialize)]
struct StateRecordRef<'a> {
    version: u16,
    state: &'a RootState,
}

#[derive(Deserialize)]
struct StateRecord {
    version: u16,
    state: RootState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tip3_protocol::{CodeBlob, PublicKey, TemplatePin};

    fn state() -> RootState {
        let code = CodeBlob::new(b"wallet code".to_vec());
        RootState {
            metadata: TokenMetadata::new("Token", "TOK", 9),
            owner: OwnerCredential::PublicKey(PublicKey::from_bytes([7; 32])),
            ledger: SupplyLedger::new(1_000),
            wallet_template: Some(VerifiedTemplate::verify(code.clone(), &TemplatePin::of(&code)).unwrap()),
            topology: Topology {
                checker: Address::new(0, [1; 32]),
                receiver: Address::new(0, [2; 32]),
                old_root: None,
                new_root: Some(Address::new(0, [3; 32])),
                trusted: None,
                eth_root: [9; 32],
            },
            funding: FundingState::default(),
        }
    }

    #[test]
    fn record_roundtrip_is_exact() {
        let original = state();
        let bytes = original.to_record().unwrap();
        let decoded = RootState::from_record(&bytes).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.to_record().unwrap(), bytes);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = state().to_record().unwrap();
        // bincode writes the u16 version little-endian up front.
        bytes[0] = 2;
        assert!(matches!(RootState::from_record(&bytes), Err(RootError::Record(_))));
    }

    #[test]
    fn truncated_record_is_rejected() {
        let bytes = state().to_record().unwrap();
        assert!(RootState::from_record(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn root_data_echoes_eth_root() {
        let data = state().root_data();
        assert_eq!(data.symbol, "TOK");
        assert_eq!(data.eth_root, [9; 32]);
    }
}
