//! Core data types for BoardVault

pub mod identity;
