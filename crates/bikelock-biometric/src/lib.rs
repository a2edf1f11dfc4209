//! Biometric authenticator for the bike lock.
//!
//! The fingerprint module does all matching internally; this crate drives
//! its primitives and reduces their confirmation codes to the outcomes the
//! lock controller acts on:
//!
//! - [`Authenticator::identify`] returns a [`MatchResult`](bikelock_core::MatchResult)
//! - [`Authenticator::enroll`] runs an [`EnrollmentSession`]
//! - [`Authenticator::delete`] and [`Authenticator::delete_all`] manage the
//!   template store

pub mod authenticator;
pub mod enrollment;
pub mod outcome;

pub use authenticator::Authenticator;
pub use enrollment::{EnrollStep, EnrollmentPhase, EnrollmentSession, EnrollmentTiming};
pub use outcome::{EnrollOutcome, StoreOutcome};
