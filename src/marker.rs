//! Section markers used by single-file captures
//!
//! A single-file capture is a sequence of sections, each introduced by one line of the form
//! `--- # Resource: <name>`. The serializer writes these lines and the diff engine and importer
//! read them back, so both sides go through this module.

/// Marker line prefix, including the YAML document separator
pub const MARKER_PREFIX: &str = "--- # Resource:";

/// Render the marker line (without trailing newline) for a section
pub fn render(name: &str) -> String {
  format!("{MARKER_PREFIX} {name}")
}

/// Extract the section name from a marker line
///
/// Markers always start at column 0; indented lines belong to item content (block scalars) and
/// are never markers. Trailing whitespace and whitespace around the name are ignored.
pub fn parse(line: &str) -> Option<&str> {
  let name = line.trim_end().strip_prefix(MARKER_PREFIX)?.trim();
  if name.is_empty() { None } else { Some(name) }
}

/// Section names in the order they appear
pub fn names(content: &str) -> Vec<String> {
  content.lines().filter_map(parse).map(str::to_owned).collect()
}

/// A named section of a single-file capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
  pub name: String,
  /// Everything between this marker and the next one
  pub body: String,
}

/// Split a capture into its sections; content before the first marker is discarded
pub fn sections(content: &str) -> Vec<Section> {
  let mut sections: Vec<Section> = Vec::new();

  for line in content.lines() {
    if let Some(name) = parse(line) {
      sections.push(Section {
        name: name.to_owned(),
        body: String::new(),
      });
    } else if let Some(current) = sections.last_mut() {
      current.body.push_str(line);
      current.body.push('\n');
    }
  }

  sections
}
