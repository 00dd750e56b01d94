use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CatalogResult;
use crate::model::{fqn, EntityHeader, EntityReference, EntityType, Id};

/// A document type persisted in its own entity table.
pub trait EntityKind: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const ENTITY_TYPE: EntityType;

    fn header(&self) -> &EntityHeader;
    fn header_mut(&mut self) -> &mut EntityHeader;

    /// Scalar columns mirrored from the document.
    fn columns(&self) -> ScalarColumns {
        ScalarColumns::default()
    }

    /// Validate and fill derived fields. Runs before every write, including
    /// after a patch, so it must be idempotent.
    fn normalize(&mut self) -> CatalogResult<()> {
        Ok(())
    }

    fn to_reference(&self) -> EntityReference {
        EntityReference::from_header(Self::ENTITY_TYPE, self.header())
    }
}

/// Denormalized columns that mirror document fields for filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarColumns {
    pub service_type: Option<String>,
    pub workflow_type: Option<String>,
    pub status: Option<String>,
}

/// One persisted row: the document plus its indexed scalar columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow<E> {
    pub id: Id,
    pub name: String,
    pub fqn_hash: String,
    pub service_type: Option<String>,
    pub workflow_type: Option<String>,
    pub status: Option<String>,
    pub json: E,
    pub updated_at: i64,
    pub updated_by: String,
    pub deleted: bool,
}

impl<E: EntityKind> EntityRow<E> {
    pub fn from_entity(json: E) -> Self {
        let header = json.header();
        let columns = json.columns();
        Self {
            id: header.id.clone(),
            name: header.name.clone(),
            fqn_hash: fqn::hash(&header.fully_qualified_name),
            service_type: columns.service_type,
            workflow_type: columns.workflow_type,
            status: columns.status,
            updated_at: header.updated_at,
            updated_by: header.updated_by.clone(),
            deleted: header.deleted,
            json,
        }
    }

    /// Re-derive every scalar column from the document.
    pub fn refresh(&mut self) {
        let json = self.json.clone();
        *self = Self::from_entity(json);
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.json.header().fully_qualified_name
    }

    pub fn into_entity(self) -> E {
        self.json
    }
}

/// Stamp the audit fields on a document before it is written.
pub fn touch<E: EntityKind>(entity: &mut E, updated_by: &str) {
    let header = entity.header_mut();
    header.updated_at = crate::model::now_millis();
    header.updated_by = updated_by.to_string();
}
