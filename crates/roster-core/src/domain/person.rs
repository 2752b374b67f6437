use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use super::FormValues;
use crate::error::ValidationErrors;

/// Person entity - one directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Timestamp ids may arrive as JSON numbers; they are kept as text.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub address: String,
    pub phone: String,
    /// URL or inline `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// A person before an identifier has been assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub age: u32,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(u64),
    Signed(i64),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Int(id) => id.to_string(),
        RawId::Signed(id) => id.to_string(),
    })
}

impl NewPerson {
    /// Build from a submitted form record.
    pub fn from_values(values: &FormValues) -> Result<Self, ValidationErrors> {
        let field = |name: &str| values.get(name).map(|v| v.trim().to_string()).unwrap_or_default();

        let age = field("age");
        let age = age.parse::<u32>().map_err(|_| {
            ValidationErrors(BTreeMap::from([(
                "age".to_string(),
                format!("Age must be a whole number, got '{}'", age),
            )]))
        })?;

        let photo = values.get("photo").filter(|p| !p.is_empty()).cloned();

        Ok(Self {
            name: field("name"),
            age,
            address: field("address"),
            phone: field("phone"),
            photo,
        })
    }
}

impl Person {
    /// Assign a caller-side identifier (milliseconds since the epoch).
    pub fn with_timestamp_id(person: NewPerson) -> Self {
        Self::with_id(Utc::now().timestamp_millis().to_string(), person)
    }

    pub fn with_id(id: impl Into<String>, person: NewPerson) -> Self {
        Self {
            id: id.into(),
            name: person.name,
            age: person.age,
            address: person.address,
            phone: person.phone,
            photo: person.photo,
        }
    }

    /// Flat record used to prefill the edit form.
    pub fn to_values(&self) -> FormValues {
        let mut values = FormValues::new();
        values.insert("name".into(), self.name.clone());
        values.insert("age".into(), self.age.to_string());
        values.insert("address".into(), self.address.clone());
        values.insert("phone".into(), self.phone.clone());
        if let Some(photo) = &self.photo {
            values.insert("photo".into(), photo.clone());
        }
        values
    }
}

impl From<Person> for NewPerson {
    fn from(person: Person) -> Self {
        Self {
            name: person.name,
            age: person.age,
            address: person.address,
            phone: person.phone,
            photo: person.photo,
        }
    }
}
