//! Shared shape of the catalog's lookup records (brands and types).
//!
//! Both are an identifier plus a single non-blank label. The trait lets the
//! service and repository layers handle them with one generic implementation.

use serde::{Deserialize, Serialize};

use eshop_core::{DomainError, DomainResult, Entity};

/// Loose input for a brand/type: every field optional.
///
/// Used for create/update bodies and for the brand/type reference carried by
/// a catalog item draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceDraft<I> {
    pub id: Option<I>,
    pub label: Option<String>,
}

impl<I> ReferenceDraft<I> {
    pub fn with_id(id: I) -> Self {
        Self {
            id: Some(id),
            label: None,
        }
    }

    pub fn new(id: Option<I>, label: Option<String>) -> Self {
        Self { id, label }
    }
}

/// A lookup record referenced by catalog items.
pub trait ReferenceEntity: Entity + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Lower-case singular name, used in messages ("brand", "type").
    const KIND: &'static str;

    /// Build a record from its parts; the label must be present and non-blank.
    fn from_parts(id: Option<Self::Id>, label: Option<String>) -> DomainResult<Self>;

    fn label(&self) -> &str;

    /// Assign the identifier handed out by storage.
    fn with_id(self, id: Self::Id) -> Self;

    /// Merge-patch: a present label replaces the current one.
    fn merged(&self, patch: ReferenceDraft<Self::Id>) -> DomainResult<Self> {
        let label = patch.label.unwrap_or_else(|| self.label().to_string());
        Self::from_parts(self.id(), Some(label))
    }
}

/// Shared label check for brands and types.
pub(crate) fn require_label(kind: &str, label: Option<String>) -> DomainResult<String> {
    match label {
        Some(label) if !label.trim().is_empty() => Ok(label),
        Some(_) => Err(DomainError::validation(format!("{kind} cannot be blank"))),
        None => Err(DomainError::validation(format!("{kind} is required"))),
    }
}
