//! Hash map used by the search caches
//!
//! With the `gxhash` feature the size memo and the similarity index use
//! gxhash's map, which needs AES-NI and SSE2 at compile time. Without it they
//! fall back to the standard library map. Maps are always created with
//! `HashMap::default()`, which both flavours support.

#[cfg(feature = "gxhash")]
pub use gxhash::HashMap;

#[cfg(not(feature = "gxhash"))]
pub use std::collections::HashMap;
