//! Zone, pivot and structure detectors
//!
//! Every detector is a pure scan over the same bar slice and returns a freshly
//! built, index-ordered `Vec`. No detector reads another's output except the
//! structure analyzer, which consumes pivots.
//!
//! # Detectors
//!
//! - **Imbalance (3 bars)**: price gaps left by a strong middle candle.
//! - **Impulse block (2 bars)**: opposite-colored candle before an outsized move.
//! - **Pivots (2L+1 bars)**: strict swing highs/lows over a symmetric window.
//! - **Structure**: breaks of structure and liquidity sweeps derived from pivots.

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod imbalance;
pub mod impulse;
pub mod pivots;
pub mod structure;

impl_with_defaults!(imbalance::ImbalanceDetector, impulse::ImpulseBlockDetector);

// Re-export all detectors for convenience
pub use helpers::*;
pub use imbalance::*;
pub use impulse::*;
pub use pivots::*;
pub use structure::*;
