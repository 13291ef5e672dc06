// Demo layer - the sequences the binary can run against a live document.

#[path = "sequences.rs"]
pub mod sequences;
