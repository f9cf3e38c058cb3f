//! Profile store boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Academic profile fields collected on the sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_role: Option<String>,
}

impl ProfileFields {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }
}

/// A row in the profiles table, keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

impl ProfileRecord {
    pub fn new(id: impl Into<String>, fields: ProfileFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn insert_profile(&self, record: &ProfileRecord) -> Result<(), ProfileError>;
}
