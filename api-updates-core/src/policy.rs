//! Knobs for how strictly a comparison is enforced.

use serde::{Deserialize, Serialize};

/// Enforcement policy for [`compare`](crate::compare) and
/// [`check_exports`](crate::check_exports).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Reject enumerations without a pinned storage width. Default: true.
    pub require_pinned_enum_repr: bool,
    /// Tolerate exported symbols the manifest does not declare. Default: false.
    pub allow_unlisted_exports: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            require_pinned_enum_repr: true,
            allow_unlisted_exports: false,
        }
    }
}

impl Policy {
    /// Strictest settings.
    pub fn strict() -> Self {
        Self::default()
    }
}
