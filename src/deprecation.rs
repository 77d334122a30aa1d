use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

use crate::version::{self, ClusterVersion};

/// Describes a resource type that is superseded starting at a given version
///
/// A rule may name a replacement type. Platform rules only apply to OpenShift clusters
/// and are compared against the platform version rather than the Kubernetes version.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DeprecationRule {
  /// The API version in `group/version` format (`v1` for the core group)
  pub group_version: String,
  /// Plural resource name as advertised by discovery
  pub resource: String,
  /// `major.minor` version where the type stops being collected
  pub deprecated_from: String,
  #[serde(default)]
  pub replacement_group_version: Option<String>,
  #[serde(default)]
  pub replacement_resource: Option<String>,
  #[serde(default)]
  pub platform: bool,
}

impl DeprecationRule {
  fn matches(&self, group_version: &str, resource: &str) -> bool {
    self.group_version == group_version && self.resource == resource
  }

  /// Whether the rule is in effect for the given cluster
  ///
  /// A rule whose `deprecated_from` cannot be parsed never fires.
  fn fires(&self, cluster: &ClusterVersion) -> bool {
    let current = if self.platform {
      match &cluster.platform {
        Some(platform) => (platform.major, platform.minor),
        None => return false,
      }
    } else {
      (cluster.major, cluster.minor)
    };

    match version::parse_major_minor(&self.deprecated_from) {
      Ok(from) => current >= from,
      Err(err) => {
        tracing::debug!(rule = %self.resource, "Ignoring rule with invalid version: {err}");
        false
      }
    }
  }

  fn replacement(&self) -> Option<Replacement> {
    match (&self.replacement_group_version, &self.replacement_resource) {
      (Some(gv), Some(resource)) if !gv.is_empty() && !resource.is_empty() => Some(Replacement {
        group_version: gv.to_owned(),
        resource: resource.to_owned(),
      }),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Replacement {
  pub group_version: String,
  pub resource: String,
}

/// Outcome of evaluating a discovered type against the rule set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
  pub skip: bool,
  pub replacement: Option<Replacement>,
  pub message: Option<String>,
}

/// Contains the static rule set embedded at compile time
#[derive(RustEmbed)]
#[folder = "data/"]
struct Data;

/// The set of known deprecation rules
#[derive(Clone, Debug, Default)]
pub struct Deprecations {
  rules: Vec<DeprecationRule>,
}

impl Deprecations {
  /// Loads the built-in rules from the embedded `deprecations.yaml`
  pub fn builtin() -> Result<Self> {
    let file = Data::get("deprecations.yaml").context("Embedded deprecations.yaml not found")?;
    let contents = std::str::from_utf8(file.data.as_ref())?;
    let rules: Vec<DeprecationRule> =
      serde_yaml::from_str(contents).context("Failed to parse embedded deprecations.yaml")?;

    Ok(Self { rules })
  }

  pub fn from_rules(rules: Vec<DeprecationRule>) -> Self {
    Self { rules }
  }

  pub fn rules(&self) -> &[DeprecationRule] {
    &self.rules
  }

  /// Decide whether `group_version/resource` should be skipped on this cluster
  ///
  /// The first matching rule that fires wins.
  pub fn evaluate(&self, resource: &str, group_version: &str, cluster: &ClusterVersion) -> Verdict {
    let rule = self
      .rules
      .iter()
      .filter(|r| r.matches(group_version, resource))
      .find(|r| r.fires(cluster));

    let Some(rule) = rule else {
      return Verdict::default();
    };

    let replacement = rule.replacement();
    let message = match &replacement {
      Some(r) => format!(
        "Using {}/{} instead of deprecated {group_version}/{resource}",
        r.group_version, r.resource
      ),
      None => format!("Skipping deprecated {group_version}/{resource} (no replacement available)"),
    };

    Verdict {
      skip: true,
      replacement,
      message: Some(message),
    }
  }
}
