//! Loosely-typed option mappings.
//!
//! Compaction parameters often arrive as string key/value pairs (job configuration,
//! CLI passthrough, environment). [`OptionSource`] is the single boundary through which
//! they are read; [`CompactionCriteria::from_options`](crate::criteria::CompactionCriteria::from_options)
//! converts them into a typed value once.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Option key for the directory to compact.
pub const SOURCE_PATH: &str = "sourcePath";
/// Option key for the output location.
pub const TARGET_PATH: &str = "targetPath";
/// Option key for the minimum directory size compacted on its own.
pub const THRESHOLD_IN_BYTES: &str = "thresholdInBytes";
/// Option key for the cap on downstream output units.
pub const MAX_REDUCERS: &str = "maxReducers";
/// Option key for the data file format.
pub const FILE_TYPE: &str = "fileType";
/// Option key for the writer schema of schema-carrying formats.
pub const SCHEMA_PATH: &str = "schemaPath";

/// A string-keyed lookup of raw option values.
///
/// A key mapped to no value behaves exactly like an absent key.
pub trait OptionSource {
    /// Returns the raw value for `key`, if one is set.
    fn option(&self, key: &str) -> Option<&str>;
}

impl<S: BuildHasher> OptionSource for HashMap<String, String, S> {
    fn option(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<S: BuildHasher> OptionSource for HashMap<String, Option<String>, S> {
    fn option(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Option::as_deref)
    }
}

impl OptionSource for BTreeMap<String, String> {
    fn option(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<T: OptionSource + ?Sized> OptionSource for &T {
    fn option(&self, key: &str) -> Option<&str> {
        (**self).option(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_values_read_as_absent() {
        let mut options: HashMap<String, Option<String>> = HashMap::new();
        options.insert(THRESHOLD_IN_BYTES.to_string(), None);
        options.insert(MAX_REDUCERS.to_string(), Some("10".to_string()));

        assert_eq!(options.option(THRESHOLD_IN_BYTES), None);
        assert_eq!(options.option(MAX_REDUCERS), Some("10"));
        assert_eq!(options.option(FILE_TYPE), None);
    }

    #[test]
    fn btree_and_hash_maps_agree() {
        let pairs = [(SOURCE_PATH, "/in"), (TARGET_PATH, "/out")];
        let hash: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let btree: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        for key in [SOURCE_PATH, TARGET_PATH, SCHEMA_PATH] {
            assert_eq!(hash.option(key), btree.option(key));
        }
    }
}
