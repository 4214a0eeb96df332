use serde::{Deserialize, Serialize};

/// A foreign key as it appears on the wire.
///
/// The hosted table API returns lookup fields either as a bare id or as an
/// embedded object carrying the referenced row's id and display name:
///
/// ```json
/// { "student_id": 4 }
/// { "student_id": { "Id": 4, "Name": "Ana Lee" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(i64),
    Embedded {
        #[serde(rename = "Id")]
        id: i64,
        #[serde(rename = "Name", default)]
        name: Option<String>,
    },
}

/// A normalised foreign key: a plain id plus an optional pre-resolved name.
///
/// Deserialises from either [`EntityRef`] shape, so code past the repository
/// boundary never has to care which one the backend sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntityRef", into = "EntityRef")]
pub struct Link {
    pub id: i64,
    pub name: Option<String>,
}

impl Link {
    pub fn bare(id: i64) -> Self {
        Self { id, name: None }
    }

    pub fn named(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<EntityRef> for Link {
    fn from(reference: EntityRef) -> Self {
        match reference {
            EntityRef::Id(id) => Self::bare(id),
            EntityRef::Embedded { id, name } => Self {
                id,
                name: name.filter(|n| !n.trim().is_empty()),
            },
        }
    }
}

impl From<Link> for EntityRef {
    fn from(link: Link) -> Self {
        match link.name {
            Some(name) => EntityRef::Embedded {
                id: link.id,
                name: Some(name),
            },
            None => EntityRef::Id(link.id),
        }
    }
}
