//! # Utility Functions Module
//!
//! Helpers for building encoder argument vectors without a `.to_string()`
//! on every element.

use std::path::Path;

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// ```ignore
/// let bitrate = 1_130_291;
/// let args = to_string_vec(["-b:v", &bitrate.to_string(), "-pass", "1"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Path as an argument; non UTF-8 parts are replaced rather than rejected
pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Builds a `Vec<String>` from mixed displayable items.
///
/// ```ignore
/// let bitrate = 1_130_291;
/// let args = args!["-c:v", "libx264", "-b:v", bitrate];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item.to_string()),*])
    };
}
