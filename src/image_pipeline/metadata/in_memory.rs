use std::collections::HashMap;

use crate::image_pipeline::metadata::provider::{MetadataProvider, MetadataValue};

/// Metadata held in a plain map, filled by the caller.
///
/// Used when metadata comes from somewhere other than the capture file itself
/// (a sidecar, a camera SDK, a test).
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    entries: HashMap<String, MetadataValue>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn lookup(&self, key: &str) -> Option<MetadataValue> {
        self.entries.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<MetadataValue>> FromIterator<(K, V)> for InMemoryMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::DevelopError;
    use crate::image_pipeline::metadata::keys;

    #[test]
    fn test_missing_and_mismatched_keys() {
        let metadata = InMemoryMetadata::new().with(keys::MAKE, vec![0xffu8, 0xfe]);

        assert!(matches!(
            metadata.get_int(keys::ORIENTATION),
            Err(DevelopError::MetadataKeyMissing { key }) if key == keys::ORIENTATION
        ));
        assert!(matches!(
            metadata.get_string(keys::MAKE),
            Err(DevelopError::MetadataTypeMismatch { expected: "string", .. })
        ));
        assert_eq!(metadata.get_bytes(keys::MAKE).unwrap(), vec![0xff, 0xfe]);
    }

    #[test]
    fn test_defaults_apply_only_when_absent() {
        let metadata = InMemoryMetadata::new().with(keys::BLACK_LEVEL, "not a number");

        assert_eq!(metadata.get_int_or(keys::ORIENTATION, 1).unwrap(), 1);
        assert!(metadata.get_int_or(keys::BLACK_LEVEL, 0).is_err());
        assert_eq!(metadata.get_string_opt(keys::MODEL).unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_and_collects() {
        let mut metadata: InMemoryMetadata =
            [(keys::SENSOR_WIDTH, 4i64), (keys::SENSOR_HEIGHT, 2)].into_iter().collect();
        metadata.set(keys::SENSOR_WIDTH, 8u16);

        assert_eq!(metadata.len(), 2);
        assert!(metadata.has_key(keys::SENSOR_HEIGHT));
        assert_eq!(metadata.get_int(keys::SENSOR_WIDTH).unwrap(), 8);
        assert_eq!(metadata.get_float(keys::SENSOR_HEIGHT).unwrap(), 2.0);
        assert!(metadata.remove(keys::SENSOR_HEIGHT).is_some());
        assert!(!metadata.has_key(keys::SENSOR_HEIGHT));
    }
}
