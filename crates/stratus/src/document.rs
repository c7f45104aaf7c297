//! Request/response envelope shared by every Stratus endpoint.
//!
//! The service wraps each resource in a `data` object carrying `type`,
//! `id`, `attributes`, and `relationships`, with side-loaded resources in a
//! top-level `included` list. Attributes stay schemaless maps on purpose:
//! the client models payload shapes, not resource semantics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DocumentData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<Resource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentData {
    One(Resource),
    Many(Vec<Resource>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

/// A bare `type`/`id` pair, used in relationship data and batch deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl Document {
    pub fn empty() -> Self {
        Document {
            data: None,
            included: None,
            meta: None,
        }
    }

    /// The single resource in `data`, if the document holds exactly one.
    pub fn single(&self) -> Option<&Resource> {
        match &self.data {
            Some(DocumentData::One(resource)) => Some(resource),
            _ => None,
        }
    }

    /// Consumes the document, yielding its single resource.
    pub fn into_single(self) -> Result<Resource, ApiError> {
        match self.data {
            Some(DocumentData::One(resource)) => Ok(resource),
            _ => Err(ApiError::Decode(
                "expected a single resource in 'data'".to_string(),
            )),
        }
    }

    /// All resources in `data`, regardless of singular/plural shape.
    pub fn many(&self) -> &[Resource] {
        match &self.data {
            Some(DocumentData::Many(resources)) => resources,
            Some(DocumentData::One(resource)) => std::slice::from_ref(resource),
            None => &[],
        }
    }

    /// Consumes the document, yielding its resource list.
    pub fn into_many(self) -> Vec<Resource> {
        match self.data {
            Some(DocumentData::Many(resources)) => resources,
            Some(DocumentData::One(resource)) => vec![resource],
            None => Vec::new(),
        }
    }

    pub fn has_included(&self) -> bool {
        self.included.as_ref().is_some_and(|i| !i.is_empty())
    }
}

impl Resource {
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(Value::as_bool)
    }

    /// The resource id; server-owned resources always carry one.
    pub fn require_id(&self) -> Result<&str, ApiError> {
        self.id
            .as_deref()
            .ok_or_else(|| ApiError::Decode(format!("{} resource is missing an id", self.kind)))
    }
}
