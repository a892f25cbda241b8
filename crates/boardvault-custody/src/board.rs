//! Board registry
//!
//! The board is a fixed-size set of member identities. Size and uniqueness
//! are enforced once at construction; afterwards the registry only answers
//! membership queries.

use std::collections::HashSet;

use boardvault_common::{BoardError, Identity, BOARD_SIZE};
use serde::Serialize;

/// Immutable set of authorized board members
#[derive(Debug, Clone, Serialize)]
pub struct BoardRegistry {
    /// Members in construction order
    members: Vec<Identity>,
    #[serde(skip)]
    index: HashSet<Identity>,
}

impl BoardRegistry {
    /// Build a registry that must contain exactly `expected_size` distinct members
    ///
    /// An empty board is rejected.
    pub fn new(members: Vec<Identity>, expected_size: usize) -> Result<Self, BoardError> {
        if expected_size == 0 || members.len() != expected_size {
            return Err(BoardError::InvalidBoardSize {
                expected: expected_size,
                actual: members.len(),
            });
        }

        let mut index = HashSet::with_capacity(members.len());
        for member in &members {
            if !index.insert(member.clone()) {
                return Err(BoardError::DuplicateMember(member.to_string()));
            }
        }

        Ok(Self { members, index })
    }

    /// Build a registry of the default board size
    pub fn standard(members: Vec<Identity>) -> Result<Self, BoardError> {
        Self::new(members, BOARD_SIZE)
    }

    #[inline]
    pub fn is_member(&self, identity: &Identity) -> bool {
        self.index.contains(identity)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Members in construction order
    pub fn members(&self) -> &[Identity] {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Identity> {
        (0..n)
            .map(|i| Identity::new(format!("member-{}", i)).unwrap())
            .collect()
    }

    #[test]
    fn test_standard_board() {
        let board = BoardRegistry::standard(ids(20)).unwrap();
        assert_eq!(board.size(), 20);
        assert!(board.is_member(&Identity::new("member-7").unwrap()));
        assert!(!board.is_member(&Identity::new("member-20").unwrap()));
        assert_eq!(board.members()[0].as_str(), "member-0");
    }

    #[test]
    fn test_wrong_size_rejected() {
        let err = BoardRegistry::standard(ids(19)).unwrap_err();
        assert_eq!(
            err,
            BoardError::InvalidBoardSize {
                expected: 20,
                actual: 19
            }
        );
        assert!(BoardRegistry::standard(ids(21)).is_err());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut members = ids(19);
        members.push(Identity::new("member-3").unwrap());
        let err = BoardRegistry::standard(members).unwrap_err();
        assert_eq!(err, BoardError::DuplicateMember("member-3".to_string()));
    }

    #[test]
    fn test_empty_board_rejected() {
        assert!(BoardRegistry::new(vec![], 0).is_err());
    }

    #[test]
    fn test_custom_size() {
        let board = BoardRegistry::new(ids(3), 3).unwrap();
        assert_eq!(board.size(), 3);
    }
}
