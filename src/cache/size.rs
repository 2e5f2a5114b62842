//! Size Estimation Module
//!
//! Approximate in-memory footprint of cached values, computed by walking
//! atomic values, sequences, mappings and records.
//!
//! The estimate is advisory. It is exact only for values built from
//! primitives, strings, sequences, mappings and tuples of those. Container
//! headers, allocator slack and hash table overhead are not counted.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::mem::size_of;
use std::rc::Rc;
use std::sync::Arc;

// == Estimate Size Trait ==
/// Values whose footprint the cache can estimate.
///
/// Types the walker has no rule for can opt in with an empty impl and get
/// the shallow `size_of::<Self>()` estimate:
///
/// ```
/// use expiring_cache::EstimateSize;
///
/// struct Handle(u64);
/// impl EstimateSize for Handle {}
///
/// assert_eq!(Handle(7).estimated_size(), 8);
/// ```
///
/// Records should sum their fields:
///
/// ```
/// use expiring_cache::EstimateSize;
///
/// struct User {
///     name: String,
///     age: u8,
/// }
///
/// impl EstimateSize for User {
///     fn estimated_size(&self) -> usize {
///         self.name.estimated_size() + self.age.estimated_size()
///     }
/// }
///
/// let user = User { name: "ann".to_string(), age: 30 };
/// assert_eq!(user.estimated_size(), 4);
/// ```
pub trait EstimateSize {
    /// Estimated size of the value in bytes.
    fn estimated_size(&self) -> usize
    where
        Self: Sized,
    {
        size_of::<Self>()
    }
}

macro_rules! impl_atomic {
    ($($ty:ty),* $(,)?) => {
        $(impl EstimateSize for $ty {})*
    };
}

impl_atomic!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, (),
);

impl EstimateSize for String {
    fn estimated_size(&self) -> usize {
        self.len()
    }
}

impl EstimateSize for &str {
    fn estimated_size(&self) -> usize {
        self.len()
    }
}

fn sum_elements<'a, T, I>(items: I) -> usize
where
    T: EstimateSize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(EstimateSize::estimated_size).sum()
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn estimated_size(&self) -> usize {
        sum_elements(self)
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn estimated_size(&self) -> usize {
        sum_elements(self)
    }
}

impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn estimated_size(&self) -> usize {
        sum_elements(self)
    }
}

impl<T: EstimateSize> EstimateSize for HashSet<T> {
    fn estimated_size(&self) -> usize {
        sum_elements(self)
    }
}

impl<T: EstimateSize> EstimateSize for BTreeSet<T> {
    fn estimated_size(&self) -> usize {
        sum_elements(self)
    }
}

impl<K: EstimateSize, V: EstimateSize, S> EstimateSize for HashMap<K, V, S> {
    fn estimated_size(&self) -> usize {
        self.iter()
            .map(|(k, v)| k.estimated_size() + v.estimated_size())
            .sum()
    }
}

impl<K: EstimateSize, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn estimated_size(&self) -> usize {
        self.iter()
            .map(|(k, v)| k.estimated_size() + v.estimated_size())
            .sum()
    }
}

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn estimated_size(&self) -> usize {
        self.as_ref().map_or(0, EstimateSize::estimated_size)
    }
}

impl<T: EstimateSize> EstimateSize for Box<T> {
    fn estimated_size(&self) -> usize {
        (**self).estimated_size()
    }
}

impl<T: EstimateSize> EstimateSize for Arc<T> {
    fn estimated_size(&self) -> usize {
        (**self).estimated_size()
    }
}

impl<T: EstimateSize> EstimateSize for Rc<T> {
    fn estimated_size(&self) -> usize {
        (**self).estimated_size()
    }
}

macro_rules! impl_record_tuple {
    ($($name:ident),+) => {
        impl<$($name: EstimateSize),+> EstimateSize for ($($name,)+) {
            #[allow(non_snake_case)]
            fn estimated_size(&self) -> usize {
                let ($($name,)+) = self;
                0 $(+ $name.estimated_size())+
            }
        }
    };
}

impl_record_tuple!(A);
impl_record_tuple!(A, B);
impl_record_tuple!(A, B, C);
impl_record_tuple!(A, B, C, D);
impl_record_tuple!(A, B, C, D, E);
impl_record_tuple!(A, B, C, D, E, F);

impl EstimateSize for serde_json::Value {
    fn estimated_size(&self) -> usize {
        use serde_json::Value;

        match self {
            Value::Null => 0,
            Value::Bool(b) => b.estimated_size(),
            Value::Number(_) => size_of::<f64>(),
            Value::String(s) => s.estimated_size(),
            Value::Array(items) => sum_elements(items),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| k.estimated_size() + v.estimated_size())
                .sum(),
        }
    }
}
