use serde::{Deserialize, Serialize};

use eshop_core::{CatalogBrandId, DomainResult, Entity};

use crate::reference::{ReferenceEntity, require_label};

/// Entity: CatalogBrand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBrand {
    id: Option<CatalogBrandId>,
    brand: String,
}

impl CatalogBrand {
    pub fn new(id: Option<CatalogBrandId>, brand: impl Into<String>) -> DomainResult<Self> {
        Self::from_parts(id, Some(brand.into()))
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }
}

impl Entity for CatalogBrand {
    type Id = CatalogBrandId;

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}

impl ReferenceEntity for CatalogBrand {
    const KIND: &'static str = "brand";

    fn from_parts(id: Option<Self::Id>, label: Option<String>) -> DomainResult<Self> {
        let brand = require_label(Self::KIND, label)?;
        Ok(Self { id, brand })
    }

    fn label(&self) -> &str {
        &self.brand
    }

    fn with_id(mut self, id: Self::Id) -> Self {
        self.id = Some(id);
        self
    }
}
