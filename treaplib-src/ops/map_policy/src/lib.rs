//! Capability traits for ordered maps.
//!
//! A map parameterized by a policy `P` asks it for three kinds of
//! operations:
//!
//! - [`KeyOrder`]: a three-way comparison of keys.
//! - [`Release`]: disposal of keys and values leaving the map.
//! - [`Duplicate`]: copies of keys and values, only needed for cloning.
//!
//! [`MapPolicy`] and [`ClonePolicy`] are blanket-implemented bundles.
//!
//! ```
//! use std::cmp::Ordering;
//!
//! use map_policy::{def_policy, KeyOrder, Natural, Reverse};
//!
//! assert_eq!(Natural.compare(&1, &2), Ordering::Less);
//! assert_eq!(Reverse.compare(&1, &2), Ordering::Greater);
//!
//! def_policy! {
//!     ByLen = (&'static str, |x: &&str, y: &&str| {
//!         x.len().cmp(&y.len()).then_with(|| x.cmp(y))
//!     }),
//! }
//! assert_eq!(ByLen::new().compare(&"ab", &"c"), Ordering::Greater);
//! ```

use std::{cmp::Ordering, fmt, mem};

pub trait KeyOrder<K> {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering;
}

/// Disposal hooks. Every key or value a map consumes without storing it,
/// or releases from storage, is passed through here.
pub trait Release<K, V> {
    fn drop_key(&self, key: K) { drop(key) }
    fn drop_value(&self, value: V) { drop(value) }
}

pub trait Duplicate<K, V>: Release<K, V> {
    fn clone_key(&self, key: &K) -> K;
    fn clone_value(&self, value: &V) -> V;

    /// Overwrites `dst` with a copy of `src`. The previous key goes
    /// through [`Release::drop_key`].
    fn clone_key_from(&self, dst: &mut K, src: &K) {
        let old = mem::replace(dst, self.clone_key(src));
        self.drop_key(old);
    }
    fn clone_value_from(&self, dst: &mut V, src: &V) {
        let old = mem::replace(dst, self.clone_value(src));
        self.drop_value(old);
    }
}

pub trait MapPolicy<K, V>: KeyOrder<K> + Release<K, V> {}
pub trait ClonePolicy<K, V>: MapPolicy<K, V> + Duplicate<K, V> {}

impl<K, V, P: KeyOrder<K> + Release<K, V>> MapPolicy<K, V> for P {}
impl<K, V, P: MapPolicy<K, V> + Duplicate<K, V>> ClonePolicy<K, V> for P {}

/// `Ord` order, `Drop` disposal and `Clone` copies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Natural;

/// The reverse of `Ord` order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Reverse;

/// Order given by a closure.
#[derive(Clone, Copy, Default)]
pub struct CompareBy<F>(pub F);

impl<K: Ord> KeyOrder<K> for Natural {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering { lhs.cmp(rhs) }
}

impl<K: Ord> KeyOrder<K> for Reverse {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering { rhs.cmp(lhs) }
}

impl<K, F: Fn(&K, &K) -> Ordering> KeyOrder<K> for CompareBy<F> {
    fn compare(&self, lhs: &K, rhs: &K) -> Ordering { (self.0)(lhs, rhs) }
}

impl<F> fmt::Debug for CompareBy<F> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("CompareBy").finish_non_exhaustive()
    }
}

macro_rules! impl_clone_lifecycle {
    ( $($name:ident$(<$gen:ident>)?),* ) => { $(
        impl<K, V $(, $gen)?> Release<K, V> for $name$(<$gen>)? {}
        impl<K: Clone, V: Clone $(, $gen)?> Duplicate<K, V>
            for $name$(<$gen>)?
        {
            fn clone_key(&self, key: &K) -> K { key.clone() }
            fn clone_value(&self, value: &V) -> V { value.clone() }
            fn clone_key_from(&self, dst: &mut K, src: &K) {
                dst.clone_from(src)
            }
            fn clone_value_from(&self, dst: &mut V, src: &V) {
                dst.clone_from(src)
            }
        }
    )* };
}

impl_clone_lifecycle! { Natural, Reverse, CompareBy<F> }

/// Declares a zero-sized policy type from a comparator expression.
/// Disposal is `Drop`, copies are `Clone`.
#[macro_export]
macro_rules! def_policy_generics {
    (
        $name:ident[$($gen:tt)*] where [$($where:tt)*] =
            ($ty:ty, $cmp:expr $(,)?)
    ) => {
        struct $name<$($gen)*>(std::marker::PhantomData<fn() -> ($($gen)*)>)
        where $($where)*;
        impl<$($gen)*> $name<$($gen)*>
        where $($where)*
        {
            fn new() -> Self { Self(std::marker::PhantomData) }
        }
        impl<$($gen)*> $crate::KeyOrder<$ty> for $name<$($gen)*>
        where $($where)*
        {
            fn compare(&self, lhs: &$ty, rhs: &$ty) -> std::cmp::Ordering {
                ($cmp)(lhs, rhs)
            }
        }
        impl<__K, __V, $($gen)*> $crate::Release<__K, __V> for $name<$($gen)*>
        where $($where)*
        {}
        impl<__K: Clone, __V: Clone, $($gen)*> $crate::Duplicate<__K, __V>
            for $name<$($gen)*>
        where $($where)*
        {
            fn clone_key(&self, key: &__K) -> __K { key.clone() }
            fn clone_value(&self, value: &__V) -> __V { value.clone() }
        }
        impl<$($gen)*> Clone for $name<$($gen)*>
        where $($where)*
        {
            fn clone(&self) -> Self { Self::new() }
        }
        impl<$($gen)*> Default for $name<$($gen)*>
        where $($where)*
        {
            fn default() -> Self { Self::new() }
        }
    };
    (
        $($name:ident[$($gen:tt)*] where [$($where:tt)*] = ($($impl:tt)*)),*
    ) => { $(
        $crate::def_policy_generics! {
            $name[$($gen)*] where [$($where)*] = ($($impl)*)
        }
    )* };
    (
        $($name:ident[$($gen:tt)*] where [$($where:tt)*] = ($($impl:tt)*),)*
    ) => { $(
        $crate::def_policy_generics! {
            $name[$($gen)*] where [$($where)*] = ($($impl)*)
        }
    )* };
}

#[macro_export]
macro_rules! def_policy {
    ( $name:ident = ($ty:ty, $cmp:expr $(,)?) ) => {
        $crate::def_policy_generics! { $name[] where [] = ($ty, $cmp) }
    };
    ( $($name:ident = ($($impl:tt)*)),* ) => { $(
        $crate::def_policy! { $name = ($($impl)*) }
    )* };
    ( $($name:ident = ($($impl:tt)*),)* ) => { $(
        $crate::def_policy! { $name = ($($impl)*) }
    )* };
}
