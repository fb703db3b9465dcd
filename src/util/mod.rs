//! Internal utilities.
//!
//! Everything here must stay deterministic: explored iterations are only
//! reproducible if hashing and random sources behave identically across runs.

pub mod det_hash;
pub mod det_rng;

pub use det_hash::{DetBuildHasher, DetHashMap, DetHasher, fingerprint};
pub use det_rng::DetRng;
