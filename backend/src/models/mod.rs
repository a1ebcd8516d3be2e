pub mod participants;
pub mod pairings;

pub use participants::Participant;
pub use pairings::{Pairing, PairingSide, PairingStatus};
