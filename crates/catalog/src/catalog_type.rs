use serde::{Deserialize, Serialize};

use eshop_core::{CatalogTypeId, DomainResult, Entity};

use crate::reference::{ReferenceEntity, require_label};

/// Entity: CatalogType (e.g. "Mug", "T-Shirt").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogType {
    id: Option<CatalogTypeId>,
    #[serde(rename = "type")]
    kind: String,
}

impl CatalogType {
    pub fn new(id: Option<CatalogTypeId>, kind: impl Into<String>) -> DomainResult<Self> {
        Self::from_parts(id, Some(kind.into()))
    }

    /// The type label (`type` is reserved in Rust).
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl Entity for CatalogType {
    type Id = CatalogTypeId;

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}

impl ReferenceEntity for CatalogType {
    const KIND: &'static str = "type";

    fn from_parts(id: Option<Self::Id>, label: Option<String>) -> DomainResult<Self> {
        let kind = require_label(Self::KIND, label)?;
        Ok(Self { id, kind })
    }

    fn label(&self) -> &str {
        &self.kind
    }

    fn with_id(mut self, id: Self::Id) -> Self {
        self.id = Some(id);
        self
    }
}
