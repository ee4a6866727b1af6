//! Path helpers for `/`-delimited data locations.
//!
//! Paths may be plain (`/warehouse/events`, `warehouse/events`) or carry a
//! `scheme://authority` prefix (`hdfs://nn:8020/warehouse/events`). The prefix is kept
//! verbatim and never treated as a path segment.
//!
//! # Layout
//!
//! ```text
//! /warehouse/events/                  <- parent (rollup key basis)
//! ├── dt=2024-01-01/                  <- directory of a work unit (self key basis)
//! │   ├── part-00000.avro             <- work unit
//! │   ├── part-00001.avro
//! │   └── _SUCCESS                    <- hidden, never a work unit
//! └── dt=2024-01-02/
//!     └── part-00000.avro
//! ```

/// Separator between path segments.
pub const DELIMITER: char = '/';

/// Path derivation for data directories and files.
///
/// # Example
///
/// ```
/// use squeeze_core::paths::DataPaths;
///
/// assert_eq!(DataPaths::normalize("/warehouse/events/"), "/warehouse/events");
/// assert_eq!(
///     DataPaths::parent("/warehouse/events/dt=2024-01-01").as_deref(),
///     Some("/warehouse/events")
/// );
/// assert!(DataPaths::is_hidden("/warehouse/events/_SUCCESS"));
/// ```
pub struct DataPaths;

impl DataPaths {
    /// Removes trailing delimiters, keeping a lone root delimiter intact.
    #[must_use]
    pub fn normalize(path: &str) -> String {
        let (authority, rest) = split_authority(path);
        let trimmed = rest.trim_end_matches(DELIMITER);
        if trimmed.is_empty() && (rest.starts_with(DELIMITER) || !authority.is_empty()) {
            return format!("{authority}{DELIMITER}");
        }
        format!("{authority}{trimmed}")
    }

    /// Returns the directory containing `path`.
    ///
    /// A root (`/`, `scheme://authority/`) has no parent. A single relative segment has
    /// `.` as its parent.
    #[must_use]
    pub fn parent(path: &str) -> Option<String> {
        let normalized = Self::normalize(path);
        let (authority, rest) = split_authority(&normalized);

        if rest.is_empty() || rest == "/" || rest == "." {
            return None;
        }

        let parent = match rest.rfind(DELIMITER) {
            Some(0) => "/",
            Some(idx) => &rest[..idx],
            None => ".",
        };
        Some(format!("{authority}{parent}"))
    }

    /// Returns the final segment of `path`, if it has one.
    #[must_use]
    pub fn file_name(path: &str) -> Option<&str> {
        let (_, rest) = split_authority(path);
        let trimmed = rest.trim_end_matches(DELIMITER);
        let name = trimmed.rsplit(DELIMITER).next().unwrap_or(trimmed);
        (!name.is_empty()).then_some(name)
    }

    /// Appends `name` to `dir` with exactly one delimiter between them.
    #[must_use]
    pub fn join(dir: &str, name: &str) -> String {
        let dir = Self::normalize(dir);
        let name = name.trim_start_matches(DELIMITER);
        if dir.ends_with(DELIMITER) {
            format!("{dir}{name}")
        } else {
            format!("{dir}{DELIMITER}{name}")
        }
    }

    /// Returns `path` relative to `base`, or `None` when `path` is not beneath `base`.
    ///
    /// A `path` equal to `base` is the empty relative path.
    #[must_use]
    pub fn relative_to(base: &str, path: &str) -> Option<String> {
        let base = Self::normalize(base);
        let path = Self::normalize(path);
        if path == base {
            return Some(String::new());
        }
        let prefix = if base.ends_with(DELIMITER) {
            base
        } else {
            format!("{base}{DELIMITER}")
        };
        path.strip_prefix(&prefix).map(str::to_string)
    }

    /// Whether `path` names a hidden entry (`_SUCCESS`, `.crc` files, `_temporary`).
    ///
    /// Hidden entries are never treated as data files.
    #[must_use]
    pub fn is_hidden(path: &str) -> bool {
        Self::file_name(path).is_some_and(|name| name.starts_with('_') || name.starts_with('.'))
    }
}

/// Splits `scheme://authority` off the front of `path`.
fn split_authority(path: &str) -> (&str, &str) {
    let Some(scheme_end) = path.find("://") else {
        return ("", path);
    };
    let after_scheme = scheme_end + 3;
    match path[after_scheme..].find(DELIMITER) {
        Some(idx) => path.split_at(after_scheme + idx),
        None => (path, ""),
    }
}
