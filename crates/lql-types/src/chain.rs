use crate::record::{StoredRecord, VersionedRecord};
use crate::reference::RecordRef;

/// A record version that may point back at its immediate predecessor.
pub trait Chained {
    /// The version's own reference.
    fn reference(&self) -> RecordRef;
    /// The predecessor's reference (None for the first version).
    fn back_reference(&self) -> Option<RecordRef>;
}

impl Chained for StoredRecord {
    fn reference(&self) -> RecordRef {
        self.reference
    }

    fn back_reference(&self) -> Option<RecordRef> {
        self.back_reference
    }
}

impl<T> Chained for VersionedRecord<T> {
    fn reference(&self) -> RecordRef {
        self.reference
    }

    fn back_reference(&self) -> Option<RecordRef> {
        self.back_reference
    }
}

/// True iff `record` names `candidate` as its immediate predecessor.
pub fn is_pointing_to(record: &impl Chained, candidate: &RecordRef) -> bool {
    record.back_reference() == Some(*candidate)
}

/// Verifies that a sequence of versions forms one chain, oldest first.
pub struct ChainVerifier;

impl ChainVerifier {
    /// Checks:
    /// 1. No version references itself
    /// 2. The first version has no back reference
    /// 3. Each later version points at the version before it
    pub fn verify(versions: &[impl Chained]) -> Result<(), ChainError> {
        for (index, version) in versions.iter().enumerate() {
            if version.back_reference() == Some(version.reference()) {
                return Err(ChainError::SelfReference { index });
            }
        }

        let Some(first) = versions.first() else {
            return Ok(());
        };
        if first.back_reference().is_some() {
            return Err(ChainError::GenesisHasBackReference);
        }

        for i in 1..versions.len() {
            let expected = versions[i - 1].reference();
            match versions[i].back_reference() {
                Some(back) if back == expected => {}
                Some(_) => return Err(ChainError::BrokenLink { index: i }),
                None => return Err(ChainError::MissingBackReference { index: i }),
            }
        }

        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first version has a back reference (should be None)")]
    GenesisHasBackReference,

    #[error("version at index {index} references itself")]
    SelfReference { index: usize },

    #[error("broken link at index {index}: back reference does not match predecessor")]
    BrokenLink { index: usize },

    #[error("missing back reference at index {index}")]
    MissingBackReference { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TransactionId;

    struct Version {
        reference: RecordRef,
        back: Option<RecordRef>,
    }

    impl Chained for Version {
        fn reference(&self) -> RecordRef {
            self.reference
        }
        fn back_reference(&self) -> Option<RecordRef> {
            self.back
        }
    }

    fn build_chain(count: usize) -> Vec<Version> {
        let mut chain = Vec::new();
        let mut back = None;
        for i in 0..count {
            let reference =
                RecordRef::new(TransactionId::from_bytes(format!("v{i}").as_bytes()), 0);
            chain.push(Version { reference, back });
            back = Some(reference);
        }
        chain
    }

    #[test]
    fn empty_chain_is_valid() {
        let chain: Vec<Version> = vec![];
        assert!(ChainVerifier::verify(&chain).is_ok());
    }

    #[test]
    fn multi_version_chain() {
        assert!(ChainVerifier::verify(&build_chain(5)).is_ok());
    }

    #[test]
    fn genesis_with_back_reference_fails() {
        let mut chain = build_chain(2);
        chain[0].back = Some(chain[1].reference);
        assert_eq!(
            ChainVerifier::verify(&chain).unwrap_err(),
            ChainError::GenesisHasBackReference
        );
    }

    #[test]
    fn self_reference_detected() {
        let mut chain = build_chain(3);
        chain[2].back = Some(chain[2].reference);
        assert_eq!(
            ChainVerifier::verify(&chain).unwrap_err(),
            ChainError::SelfReference { index: 2 }
        );
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3);
        chain[2].back = Some(chain[0].reference);
        assert_eq!(
            ChainVerifier::verify(&chain).unwrap_err(),
            ChainError::BrokenLink { index: 2 }
        );
    }

    #[test]
    fn missing_back_reference_detected() {
        let mut chain = build_chain(3);
        chain[1].back = None;
        assert_eq!(
            ChainVerifier::verify(&chain).unwrap_err(),
            ChainError::MissingBackReference { index: 1 }
        );
    }

    #[test]
    fn pointing_to_compares_back_reference() {
        let chain = build_chain(3);
        assert!(is_pointing_to(&chain[2], &chain[1].reference));
        assert!(!is_pointing_to(&chain[2], &chain[0].reference));
        assert!(!is_pointing_to(&chain[0], &chain[0].reference));
    }
}
