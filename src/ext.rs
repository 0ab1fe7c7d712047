//! Public extension contracts for callers that drive their own HTTP clients.
//!
//! [`RequestSignerExt`] lets a signed body travel through any request builder while
//! keeping the body and the `Sign` header in lockstep.

pub mod request_signer;

pub use request_signer::*;
