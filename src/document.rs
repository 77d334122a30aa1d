use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// A schema-agnostic Kubernetes object
///
/// Every resource, whether read from a must-gather file or returned by the API server, is kept
/// as an ordered attribute mapping. Only the few fields needed to key and unwrap documents have
/// typed accessors; everything else is carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Mapping);

impl Document {
  /// Parse a single YAML document, returning `None` unless it is a mapping
  pub fn parse(text: &str) -> Result<Option<Self>> {
    let value: Value = serde_yaml::from_str(text)?;
    Ok(Self::from_value(value))
  }

  pub fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Mapping(mapping) => Some(Self(mapping)),
      _ => None,
    }
  }

  /// Convert any serializable object (e.g. a `DynamicObject`) into a document
  pub fn from_serializable<T: Serialize>(object: &T) -> Result<Option<Self>> {
    Ok(Self::from_value(serde_yaml::to_value(object)?))
  }

  fn non_empty_str(&self, field: &str) -> Option<&str> {
    self.0.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
  }

  pub fn api_version(&self) -> Option<&str> {
    self.non_empty_str("apiVersion")
  }

  pub fn kind(&self) -> Option<&str> {
    self.non_empty_str("kind")
  }

  /// `true` for the `List` wrapper kind
  pub fn is_list(&self) -> bool {
    self.kind() == Some("List")
  }

  /// Entries of `items` that are themselves mappings
  ///
  /// `None` when the field is absent or not a sequence.
  pub fn items(&self) -> Option<Vec<Document>> {
    let items = self.0.get("items")?.as_sequence()?;
    Some(items.iter().cloned().filter_map(Document::from_value).collect())
  }

  pub fn into_mapping(self) -> Mapping {
    self.0
  }
}

impl From<Mapping> for Document {
  fn from(mapping: Mapping) -> Self {
    Self(mapping)
  }
}
