// Core protocol library for the SPHINX governance console

// Stage ordering and agent attribution
pub mod stage;

// Framework catalog
pub mod framework;

// Six-stage analysis result model
pub mod result;

// Staged reveal state machine
pub mod reveal;

// Oversight artifact rendering
pub mod artifact;

// Hash-chained activity log
pub mod audit;

// Non-cryptographic digest helper
pub mod digest;

// Error taxonomy
pub mod error;

pub use error::ProtocolError;
