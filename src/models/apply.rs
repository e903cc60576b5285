//! Apply workflow types.

use super::{SaveResponse, Taxonomy};
use serde::{Deserialize, Serialize};

/// A persisted record of an accepted taxonomy change.
///
/// Holds enough information to issue a compensating write that restores the
/// taxonomy the entry had before the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyRecord {
    /// Symbol the change was applied to.
    pub symbol: String,
    /// Category before the change.
    #[serde(rename = "prev_cat")]
    pub previous_category: Option<String>,
    /// Subcategory before the change.
    #[serde(rename = "prev_subcat")]
    pub previous_subcategory: Option<String>,
    /// Category written by the change.
    #[serde(rename = "new_cat")]
    pub new_category: Option<String>,
    /// Subcategory written by the change.
    #[serde(rename = "new_subcat")]
    pub new_subcategory: Option<String>,
    /// Combined score of the applied selection.
    pub score: f64,
    /// When the change was recorded (ISO-8601, UTC).
    #[serde(default)]
    pub recorded_at: String,
}

impl ApplyRecord {
    /// Taxonomy to restore on undo.
    #[must_use]
    pub fn previous(&self) -> Taxonomy {
        Taxonomy::new(
            self.previous_category.clone(),
            self.previous_subcategory.clone(),
        )
    }
}

/// The suggestion chosen for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Selected category.
    pub category: Option<String>,
    /// Selected subcategory.
    pub subcategory: Option<String>,
    /// Combined score.
    pub score: f64,
}

impl Selection {
    /// Returns the selection as a taxonomy.
    #[must_use]
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::new(self.category.clone(), self.subcategory.clone())
    }

    /// Returns true if neither side was selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none() && self.subcategory.is_none()
    }
}

/// A caller's decision on a pending suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Apply the selection as-is.
    Accept,
    /// Apply with replacements; `None` or blank keeps the suggested value.
    Edit {
        /// Replacement category.
        category: Option<String>,
        /// Replacement subcategory.
        subcategory: Option<String>,
    },
    /// Leave the entry unchanged.
    Reject,
    /// Revert the most recently recorded change.
    Undo,
}

impl Decision {
    /// Parses an interactive answer (`y`, `n`, `e`, `u`, case-insensitive).
    ///
    /// Anything unrecognised is treated as a rejection. `e` yields an edit
    /// with no replacements; callers fill them in.
    #[must_use]
    pub fn parse_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Self::Accept,
            "e" | "edit" => Self::Edit {
                category: None,
                subcategory: None,
            },
            "u" | "undo" => Self::Undo,
            _ => Self::Reject,
        }
    }
}

/// Terminal state of the apply workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The suggestion was written unchanged.
    Accepted {
        /// Journal record written for the change.
        record: ApplyRecord,
        /// Response of the follow-up save.
        response: SaveResponse,
    },
    /// An edited suggestion was written.
    Edited {
        /// Journal record written for the change.
        record: ApplyRecord,
        /// Response of the follow-up save.
        response: SaveResponse,
    },
    /// Nothing was written.
    Rejected,
    /// The latest recorded change was reverted.
    Undone {
        /// The record that was reverted (left in the journal).
        record: ApplyRecord,
        /// Response of the compensating save.
        response: SaveResponse,
    },
    /// Undo was requested but the journal is empty.
    NothingToUndo,
}
