use std::{cmp::Ordering, fmt, hash};

use serde::{Serialize, Serializer};

/// Characters that are not safe to carry into a filename
const UNSAFE_FILENAME_CHARS: [char; 10] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' '];

/// Replace filesystem-unsafe characters with `-`
pub fn sanitize(name: &str) -> String {
  name.replace(UNSAFE_FILENAME_CHARS, "-")
}

/// Same as [`sanitize`] but also replaces `.`, used for cluster and bundle names
pub fn sanitize_name(name: &str) -> String {
  sanitize(name).replace('.', "-")
}

/// Lower-case the kind and append `s` unless it already ends in `s`
///
/// There is deliberately no irregular plural table: `NetworkPolicy` becomes `networkpolicys`
/// and `Ingress` stays `ingress`, neither of which matches the name the API server advertises.
pub fn pluralize(kind: &str) -> String {
  let lower = kind.to_lowercase();
  if lower.is_empty() || lower.ends_with('s') {
    lower
  } else {
    format!("{lower}s")
  }
}

/// Canonical identifier of a resource type: `{groupVersion}-{pluralResourceName}`
///
/// Keys compare, hash and sort by their rendered form so that the inventory order matches the
/// byte order of the rendered keys.
#[derive(Clone, Debug)]
pub struct ResourceKey {
  key: String,
  group_version: String,
  resource: String,
}

impl ResourceKey {
  /// Key for a type inferred from a document's `apiVersion` and singular `kind`
  pub fn from_kind(api_version: &str, kind: &str) -> Self {
    Self::new(api_version, &pluralize(kind))
  }

  /// Key for a type advertised by discovery, whose name is already plural
  pub fn from_resource(group_version: &str, resource: &str) -> Self {
    Self::new(group_version, resource)
  }

  fn new(group_version: &str, resource: &str) -> Self {
    Self {
      key: format!("{}-{}", sanitize(group_version), sanitize(resource)),
      group_version: group_version.to_owned(),
      resource: resource.to_owned(),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.key
  }

  /// The unsanitized `group/version` the key was built from
  pub fn group_version(&self) -> &str {
    &self.group_version
  }

  /// The plural resource name the key was built from
  pub fn resource(&self) -> &str {
    &self.resource
  }

  /// Filename used in directory mode
  pub fn filename(&self) -> String {
    format!("{}.yaml", self.key)
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.key)
  }
}

impl PartialEq for ResourceKey {
  fn eq(&self, other: &Self) -> bool {
    self.key == other.key
  }
}

impl Eq for ResourceKey {}

impl hash::Hash for ResourceKey {
  fn hash<H: hash::Hasher>(&self, state: &mut H) {
    self.key.hash(state);
  }
}

impl PartialOrd for ResourceKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for ResourceKey {
  fn cmp(&self, other: &Self) -> Ordering {
    self.key.cmp(&other.key)
  }
}

impl Serialize for ResourceKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.key)
  }
}
