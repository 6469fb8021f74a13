// HTTP handlers, one module per resource

pub mod analytics;
pub mod auth;
pub mod categories;
pub mod departments;
pub mod grievances;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`); use with `#[serde(default, deserialize_with = "nullable")]`
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
