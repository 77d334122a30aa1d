use std::{collections::BTreeSet, fmt::Write as _};

use serde::Serialize;

use crate::{inventory::Inventory, marker};

/// Type-level comparison of two captures
///
/// Only the presence of a resource type is compared; two captures that both contain `v1-pods`
/// count it as common even when the pods themselves differ.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
  pub only_in_first: BTreeSet<String>,
  pub only_in_second: BTreeSet<String>,
  pub common: BTreeSet<String>,
  /// Distinct resource types in the first capture
  pub first_total: usize,
  /// Distinct resource types in the second capture
  pub second_total: usize,
}

impl DiffReport {
  /// Compare two sequences of resource type names; duplicates count once
  pub fn new<A, B>(first: A, second: B) -> Self
  where
    A: IntoIterator,
    A::Item: Into<String>,
    B: IntoIterator,
    B::Item: Into<String>,
  {
    let first: BTreeSet<String> = first.into_iter().map(Into::into).collect();
    let second: BTreeSet<String> = second.into_iter().map(Into::into).collect();

    Self {
      only_in_first: first.difference(&second).cloned().collect(),
      only_in_second: second.difference(&first).cloned().collect(),
      common: first.intersection(&second).cloned().collect(),
      first_total: first.len(),
      second_total: second.len(),
    }
  }

  /// Compare two rendered single-file captures by their section markers
  pub fn from_rendered(first: &str, second: &str) -> Self {
    Self::new(marker::names(first), marker::names(second))
  }

  /// Compare two in-memory inventories by key
  pub fn from_inventories(first: &Inventory, second: &Inventory) -> Self {
    Self::new(
      first.keys().map(ToString::to_string),
      second.keys().map(ToString::to_string),
    )
  }

  /// Render the fixed-layout text report
  ///
  /// `timestamp` is the only value that varies between runs over the same input.
  pub fn render(&self, first_name: &str, second_name: &str, timestamp: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Cluster Comparison Report ===");
    let _ = writeln!(out, "Generated at: {timestamp}");
    let _ = writeln!(out, "Cluster 1: {first_name} ({} resources)", self.first_total);
    let _ = writeln!(out, "Cluster 2: {second_name} ({} resources)\n", self.second_total);

    for (name, only) in [(first_name, &self.only_in_first), (second_name, &self.only_in_second)] {
      if only.is_empty() {
        continue;
      }
      let _ = writeln!(out, "\n=== Resources only in {name} ===");
      for resource in only {
        let _ = writeln!(out, "- {resource}");
      }
    }

    if !self.common.is_empty() {
      let _ = writeln!(out, "\n=== Common resources in both clusters ===");
      let _ = writeln!(out, "Total: {} resources", self.common.len());
    }

    let _ = writeln!(out, "\n=== Summary ===");
    let _ = writeln!(out, "Total resources in {first_name}: {}", self.first_total);
    let _ = writeln!(out, "Total resources in {second_name}: {}", self.second_total);
    let _ = writeln!(out, "Only in {first_name}: {}", self.only_in_first.len());
    let _ = writeln!(out, "Only in {second_name}: {}", self.only_in_second.len());
    let _ = writeln!(out, "Common to both: {}", self.common.len());

    out
  }
}
