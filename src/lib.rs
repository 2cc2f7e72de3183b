//! Ordered maps on treaps, with pluggable key order and lifecycle.
//!
//! ```
//! use treaplib::{Reverse, TreapMap};
//!
//! let mut map = TreapMap::with_policy(Reverse);
//! for i in 0..5 {
//!     map.insert(i, i * i);
//! }
//! assert!(map.keys().copied().eq((0..5).rev()));
//! ```

macro_rules! doc_inline_reexport {
    ( $($lib:ident,)* ) => { $(
        #[doc(inline)]
        pub use $lib::{self, *};
    )* };
}

doc_inline_reexport! {
    map_policy,
    priority_gen,
    treap_map,
}
