//! (De)serialize a [`Duration`] as a number of seconds.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serializes `duration` as whole seconds.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Deserializes a number of seconds into a [`Duration`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
