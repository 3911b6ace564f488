use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attribute::{image_to_json, AttributeValue, Image};

pub const TABLE_ID: &str = "table";
pub const PARTITION_KEY: &str = "id";
pub const SORT_KEY: &str = "cpf";
pub const INDEX_NAME: &str = "secundary";
pub const INDEX_PARTITION_KEY: &str = "cpf";
pub const INDEX_SORT_KEY: &str = "nome";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record image is missing key attribute '{0}'")]
    MissingAttribute(&'static str),
    #[error("attribute '{name}' must be of type {expected}, found {found}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Primary key of a record: partition key `id` plus sort key `cpf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub id: String,
    pub cpf: String,
}

impl RecordKey {
    pub fn from_image(image: &Image) -> Result<Self, RecordError> {
        Ok(Self {
            id: required_string(image, PARTITION_KEY)?,
            cpf: required_string(image, SORT_KEY)?,
        })
    }
}

/// A person stored in the playground table.
///
/// `nome` is the sort key of the secondary index; records without it are not
/// projected into the index. Attributes beyond the keys are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: String,
    pub cpf: String,
    pub nome: Option<String>,
    #[serde(default)]
    pub attributes: Image,
}

impl PersonRecord {
    pub fn from_image(image: &Image) -> Result<Self, RecordError> {
        let key = RecordKey::from_image(image)?;
        let nome = optional_string(image, INDEX_SORT_KEY)?;
        let attributes = image
            .iter()
            .filter(|(name, _)| {
                !matches!(name.as_str(), PARTITION_KEY | SORT_KEY | INDEX_SORT_KEY)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            id: key.id,
            cpf: key.cpf,
            nome,
            attributes,
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id.clone(),
            cpf: self.cpf.clone(),
        }
    }

    /// Key under the `secundary` index, when the record is projected there.
    pub fn index_key(&self) -> Option<(&str, &str)> {
        self.nome
            .as_deref()
            .map(|nome| (self.cpf.as_str(), nome))
    }

    pub fn to_json(&self) -> Value {
        let mut body = image_to_json(&self.attributes);
        if let Value::Object(fields) = &mut body {
            fields.insert(PARTITION_KEY.to_string(), Value::from(self.id.clone()));
            fields.insert(SORT_KEY.to_string(), Value::from(self.cpf.clone()));
            if let Some(nome) = &self.nome {
                fields.insert(INDEX_SORT_KEY.to_string(), Value::from(nome.clone()));
            }
        }
        body
    }
}

fn required_string(image: &Image, name: &'static str) -> Result<String, RecordError> {
    optional_string(image, name)?.ok_or(RecordError::MissingAttribute(name))
}

fn optional_string(image: &Image, name: &'static str) -> Result<Option<String>, RecordError> {
    match image.get(name) {
        None => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(other) => Err(RecordError::WrongType {
            name,
            expected: "S",
            found: other.type_name(),
        }),
    }
}
