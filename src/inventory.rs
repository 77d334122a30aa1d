use std::collections::{BTreeMap, btree_map};

use crate::{document::Document, key::ResourceKey};

/// Resource type to collected items, for a single run
///
/// Keys are kept sorted so every rendering of the same inventory is byte-identical. Items are
/// only ever appended.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
  resources: BTreeMap<ResourceKey, Vec<Document>>,
}

impl Inventory {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a type with no items yet (a live type with zero instances still exists)
  pub fn ensure(&mut self, key: ResourceKey) -> &mut Vec<Document> {
    self.resources.entry(key).or_default()
  }

  pub fn push(&mut self, key: ResourceKey, item: Document) {
    self.ensure(key).push(item);
  }

  pub fn extend(&mut self, key: ResourceKey, items: impl IntoIterator<Item = Document>) {
    self.ensure(key).extend(items);
  }

  pub fn get(&self, key: &ResourceKey) -> Option<&[Document]> {
    self.resources.get(key).map(Vec::as_slice)
  }

  pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
    self.resources.keys()
  }

  pub fn iter(&self) -> btree_map::Iter<'_, ResourceKey, Vec<Document>> {
    self.resources.iter()
  }

  /// Number of resource types
  pub fn len(&self) -> usize {
    self.resources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.resources.is_empty()
  }

  /// Total number of items across all types
  pub fn item_count(&self) -> usize {
    self.resources.values().map(Vec::len).sum()
  }
}

impl<'a> IntoIterator for &'a Inventory {
  type Item = (&'a ResourceKey, &'a Vec<Document>);
  type IntoIter = btree_map::Iter<'a, ResourceKey, Vec<Document>>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(kind: &str) -> Document {
    Document::parse(&format!("apiVersion: v1\nkind: {kind}\n")).unwrap().unwrap()
  }

  #[test]
  fn appends_under_existing_keys() {
    let mut inventory = Inventory::new();
    inventory.push(ResourceKey::from_kind("v1", "Pod"), doc("Pod"));
    inventory.push(ResourceKey::from_kind("v1", "Pod"), doc("Pod"));
    inventory.push(ResourceKey::from_kind("v1", "Service"), doc("Service"));

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.item_count(), 3);
    assert_eq!(inventory.get(&ResourceKey::from_resource("v1", "pods")).unwrap().len(), 2);
  }

  #[test]
  fn ensure_registers_empty_types() {
    let mut inventory = Inventory::new();
    inventory.ensure(ResourceKey::from_resource("v1", "secrets"));
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory.item_count(), 0);
  }

  #[test]
  fn iterates_in_key_order() {
    let mut inventory = Inventory::new();
    inventory.ensure(ResourceKey::from_resource("v1", "services"));
    inventory.ensure(ResourceKey::from_resource("apps/v1", "deployments"));
    inventory.ensure(ResourceKey::from_resource("v1", "configmaps"));

    let keys: Vec<&str> = inventory.keys().map(ResourceKey::as_str).collect();
    assert_eq!(keys, vec!["apps-v1-deployments", "v1-configmaps", "v1-services"]);
  }
}
