//! Top-level facade crate for statlens.
//!
//! Re-exports the counter primitives and the management library so users can
//! depend on a single crate.

pub mod core {
    pub use statlens_core::*;
}

pub mod mgmt {
    pub use statlens_mgmt::*;
}
