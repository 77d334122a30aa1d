use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// API groups containing this marker identify an OpenShift cluster
const PLATFORM_GROUP_MARKER: &str = "openshift.io";

/// Platform (OpenShift) version information, when the cluster is the platform variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVersion {
  pub major: i32,
  pub minor: i32,
}

/// Version of the cluster the resources are collected from
///
/// Detected once per live collection and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVersion {
  pub major: i32,
  pub minor: i32,
  pub platform: Option<PlatformVersion>,
}

impl ClusterVersion {
  pub fn new(major: i32, minor: i32) -> Self {
    Self {
      major,
      minor,
      platform: None,
    }
  }

  /// Build the version from the server's reported major/minor and the API group names
  pub fn detect<S: AsRef<str>>(major: &str, minor: &str, api_groups: &[S]) -> Result<Self> {
    let major = parse_component(major).context("Failed to parse major version")?;
    let minor = parse_component(minor).context("Failed to parse minor version")?;

    let is_platform = api_groups.iter().any(|g| g.as_ref().contains(PLATFORM_GROUP_MARKER));
    let platform = is_platform.then(|| estimate_platform(minor));

    Ok(Self { major, minor, platform })
  }

  pub fn is_platform(&self) -> bool {
    self.platform.is_some()
  }
}

impl std::fmt::Display for ClusterVersion {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}.{}", self.major, self.minor)?;
    if let Some(platform) = &self.platform {
      write!(f, " (OpenShift ~{}.{})", platform.major, platform.minor)?;
    }
    Ok(())
  }
}

/// Parse a version component such as `1`, `27` or `27+`
fn parse_component(value: &str) -> Result<i32> {
  let trimmed = value.trim().trim_end_matches('+');
  trimmed
    .parse::<i32>()
    .with_context(|| format!("Invalid version component '{value}'"))
}

/// OpenShift 4.14 ships Kubernetes 1.27 and each later minor tracks one Kubernetes minor
fn estimate_platform(kubernetes_minor: i32) -> PlatformVersion {
  let minor = if kubernetes_minor >= 27 { 14 + (kubernetes_minor - 27) } else { 0 };
  PlatformVersion { major: 4, minor }
}

/// Parse a `major.minor` version string such as `1.33` or `4.14`
///
/// Anything after the minor component (patch, pre-release) is ignored.
pub fn parse_major_minor(version: &str) -> Result<(i32, i32)> {
  let mut parts = version.trim().trim_start_matches('v').split('.');
  let major = parts
    .next()
    .filter(|p| !p.is_empty())
    .context(format!("Invalid version format '{version}', expected 'X.Y'"))?;
  let minor = parts
    .next()
    .context(format!("Invalid version format '{version}', expected 'X.Y'"))?;

  Ok((major.parse::<i32>()?, minor.parse::<i32>()?))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detect_plain_kubernetes() {
    let groups = vec!["apps", "batch", "networking.k8s.io"];
    let version = ClusterVersion::detect("1", "33", &groups).unwrap();
    assert_eq!(version, ClusterVersion::new(1, 33));
    assert!(!version.is_platform());
  }

  #[test]
  fn detect_strips_plus_suffix() {
    let groups: Vec<String> = vec![];
    let version = ClusterVersion::detect("1", "27+", &groups).unwrap();
    assert_eq!(version.minor, 27);
  }

  #[test]
  fn detect_platform_variant() {
    let groups = vec!["apps", "apps.openshift.io", "route.openshift.io"];
    let version = ClusterVersion::detect("1", "29", &groups).unwrap();
    assert_eq!(version.platform, Some(PlatformVersion { major: 4, minor: 16 }));
  }

  #[test]
  fn platform_estimate_below_baseline() {
    let groups = vec!["config.openshift.io"];
    let version = ClusterVersion::detect("1", "25", &groups).unwrap();
    assert_eq!(version.platform, Some(PlatformVersion { major: 4, minor: 0 }));
  }

  #[test]
  fn detect_rejects_garbage() {
    let groups: Vec<&str> = vec![];
    assert!(ClusterVersion::detect("one", "27", &groups).is_err());
    assert!(ClusterVersion::detect("1", "", &groups).is_err());
  }

  #[test]
  fn parse_major_minor_valid() {
    let cases = vec![("1.33", (1, 33)), ("4.14", (4, 14)), ("v1.19.3", (1, 19))];
    for (input, expected) in cases {
      assert_eq!(parse_major_minor(input).unwrap(), expected, "parse_major_minor({input})");
    }
  }

  #[test]
  fn parse_major_minor_invalid() {
    assert!(parse_major_minor("133").is_err());
    assert!(parse_major_minor("").is_err());
    assert!(parse_major_minor("1.x").is_err());
  }

  #[test]
  fn display_includes_platform_estimate() {
    let version = ClusterVersion {
      major: 1,
      minor: 28,
      platform: Some(PlatformVersion { major: 4, minor: 15 }),
    };
    assert_eq!(version.to_string(), "1.28 (OpenShift ~4.15)");
  }
}
