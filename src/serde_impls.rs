//! Serde support for the owning value pointer (feature `serde`).
//!
//! A container serializes as its owned value, with the empty state mapping
//! to `null`, exactly like an `Option`. Deserialization targets the
//! default-policy container, since policies are code, not data.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::policy::DeletePolicy;
use crate::value_box::ValueBox;

impl<T, D, C> Serialize for ValueBox<T, D, C>
where
    T: ?Sized + Serialize,
    D: DeletePolicy<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ValueBox<T>
where
    T: Deserialize<'de> + Clone,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => ValueBox::new(value),
            None => ValueBox::empty(),
        })
    }
}
