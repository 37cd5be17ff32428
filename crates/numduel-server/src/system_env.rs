//! Production Environment implementation using system time and RNG.

use std::time::Instant;

use numduel_core::env::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// - Uses `std::time::Instant::now()` for time
/// - Uses `getrandom` for randomness, so room IDs cannot be predicted
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // NOTE: Only fails on unsupported platforms. With zeros the first
            // room gets the ID `AAAAAA` and later creations collide until they
            // hit the retry limit. Every connection ID is 0, so only one socket
            // can be open at a time.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
