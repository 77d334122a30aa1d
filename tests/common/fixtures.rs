use std::{fs, path::Path};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use serde_json::json;

use k8s_resource_collector::clients::ServerVersion;
use k8s_resource_collector::document::Document;

use super::mock_k8s::MockK8sClients;

const READ_VERBS: [&str; 3] = ["get", "list", "watch"];

/// Builds a discovery entry with the given verbs
pub fn api_resource(name: &str, kind: &str, verbs: &[&str]) -> APIResource {
  APIResource {
    name: name.to_string(),
    kind: kind.to_string(),
    verbs: verbs.iter().map(|v| v.to_string()).collect(),
    ..Default::default()
  }
}

/// Builds a readable discovery entry
pub fn readable(name: &str, kind: &str) -> APIResource {
  api_resource(name, kind, &READ_VERBS)
}

pub fn resource_list(group_version: &str, resources: Vec<APIResource>) -> APIResourceList {
  APIResourceList {
    group_version: group_version.to_string(),
    resources,
  }
}

/// Creates an object the way the API server returns it
pub fn object(api_version: &str, kind: &str, name: &str) -> Document {
  let value = json!({
    "apiVersion": api_version,
    "kind": kind,
    "metadata": { "name": name, "namespace": "default" },
  });
  Document::from_serializable(&value).unwrap().unwrap()
}

/// Builds a plain Kubernetes cluster at `1.{minor}`
///
/// Serves pods, services, configmaps and endpoints in the core group, endpointslices in
/// `discovery.k8s.io/v1` and deployments in `apps/v1`, plus a subresource and a create-only type
/// that must never be collected.
pub fn cluster(minor: u32) -> MockK8sClients {
  let mut mock = MockK8sClients {
    version: Some(ServerVersion {
      major: "1".to_string(),
      minor: format!("{minor}+"),
    }),
    groups: vec!["apps".to_string(), "discovery.k8s.io".to_string()],
    resources: vec![
      resource_list(
        "v1",
        vec![
          readable("pods", "Pod"),
          api_resource("pods/status", "Pod", &["get", "patch", "update"]),
          readable("services", "Service"),
          readable("configmaps", "ConfigMap"),
          readable("endpoints", "Endpoints"),
          api_resource("bindings", "Binding", &["create"]),
        ],
      ),
      resource_list("apps/v1", vec![readable("deployments", "Deployment")]),
      resource_list("discovery.k8s.io/v1", vec![readable("endpointslices", "EndpointSlice")]),
    ],
    ..Default::default()
  };

  mock.items.insert(
    "v1/pods".to_string(),
    vec![object("v1", "Pod", "web-0"), object("v1", "Pod", "web-1")],
  );
  mock.items.insert("v1/services".to_string(), vec![object("v1", "Service", "web")]);
  mock.items.insert("v1/endpoints".to_string(), vec![object("v1", "Endpoints", "web")]);
  mock.items.insert(
    "apps/v1/deployments".to_string(),
    vec![object("apps/v1", "Deployment", "web")],
  );
  mock.items.insert(
    "discovery.k8s.io/v1/endpointslices".to_string(),
    vec![object("discovery.k8s.io/v1", "EndpointSlice", "web-abc12")],
  );

  mock
}

/// Adds the OpenShift API groups and DeploymentConfigs to a cluster
pub fn openshift(mut mock: MockK8sClients) -> MockK8sClients {
  mock.groups.push("apps.openshift.io".to_string());
  mock.groups.push("route.openshift.io".to_string());
  mock.resources.push(resource_list(
    "apps.openshift.io/v1",
    vec![readable("deploymentconfigs", "DeploymentConfig")],
  ));
  mock.items.insert(
    "apps.openshift.io/v1/deploymentconfigs".to_string(),
    vec![object("apps.openshift.io/v1", "DeploymentConfig", "legacy")],
  );
  mock
}

/// A List with two pods followed by a standalone service
pub const PODS_AND_SERVICE: &str = r#"apiVersion: v1
kind: List
items:
- apiVersion: v1
  kind: Pod
  metadata:
    name: web-0
- apiVersion: v1
  kind: Pod
  metadata:
    name: web-1
---
apiVersion: v1
kind: Service
metadata:
  name: web
"#;

/// Writes `files` (relative path, contents) beneath `root`
pub fn must_gather(root: &Path, files: &[(&str, &str)]) {
  for (relative, contents) in files {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }
}
