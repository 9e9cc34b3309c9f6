//! Request-coalescing cache primitives.
//!
//! # Module Structure
//!
//! - `keyed`: `KeyedCache` (entry map + in-flight registry) implementing the
//!   get-or-fetch contract with request coalescing
//! - `state`: observable `ResourceState` published over watch channels

mod keyed;
mod state;

pub use keyed::{FetchMode, InFlightRegistry, KeyedCache};
pub use state::{ResourceState, StateCell};
