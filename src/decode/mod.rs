//! Detection and reconstruction of encoded payloads embedded in gathered data

pub mod decoder;
pub mod sniffer;

pub use decoder::{decode, persist, DecodeOutcome, ReconstructedFile};
pub use sniffer::{sniff, Depth, EncodedFragment};
