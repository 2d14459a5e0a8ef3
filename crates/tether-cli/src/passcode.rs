//! Shared-secret access codes.
//!
//! A run uses exactly one passcode. It comes from configuration when the
//! operator pinned one, otherwise it is drawn at startup and lives only for
//! the run.

use std::fmt;

use rand::Rng;

const PASSCODE_DIGITS: usize = 6;
const PASSCODE_SPACE: u32 = 1_000_000;

/// A shared secret handed to the server and embedded in tunnel links.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Passcode(String);

impl Passcode {
    /// Wraps an operator-supplied value unchanged.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Draws a uniformly random six digit code; leading zeros are kept.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let value = rng.gen_range(0..PASSCODE_SPACE);
        Self(format!("{value:0width$}", width = PASSCODE_DIGITS))
    }

    /// Borrows the code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Passcode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl fmt::Debug for Passcode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Passcode(******)")
    }
}

/// Where the run's passcode came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasscodeOrigin {
    /// Taken from `APP_PASSWORD`.
    Configured,
    /// Generated for this run only.
    Generated,
}

/// The passcode together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObtainedPasscode {
    /// The code shared with the server and the access link.
    pub passcode: Passcode,
    /// Whether the operator should be warned that the code is temporary.
    pub origin: PasscodeOrigin,
}

impl ObtainedPasscode {
    /// Returns true when the code was generated for this run.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.origin == PasscodeOrigin::Generated
    }
}

/// Returns the configured passcode, or a fresh one from the thread RNG.
#[must_use]
pub fn obtain_passcode(configured: Option<&str>) -> ObtainedPasscode {
    obtain_passcode_with(configured, &mut rand::thread_rng())
}

/// Variant of [`obtain_passcode`] with an injected random source.
pub fn obtain_passcode_with<R: Rng>(
    configured: Option<&str>,
    rng: &mut R,
) -> ObtainedPasscode {
    match configured {
        Some(value) => ObtainedPasscode {
            passcode: Passcode::new(value),
            origin: PasscodeOrigin::Configured,
        },
        None => ObtainedPasscode {
            passcode: Passcode::generate(rng),
            origin: PasscodeOrigin::Generated,
        },
    }
}
