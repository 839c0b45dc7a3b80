//! Readme templates shipped inside release archives.
//!
//! A template directory is loaded as a set, keyed by file name, and a single
//! template is looked up from it per archive.
//!
//! # Syntax
//!
//! - `{{.Name}}` (inner whitespace allowed: `{{ .Name }}`) - replaced by the
//!   value of `Name` from the render context
//! - `{{{{` - a literal `{{`
//!
//! Everything else, including a lone `{` or `}}`, passes through unchanged.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use qri_build_lib::template::Template;
//!
//! let tmpl = Template::parse("readme", "qri for {{.Platform}}/{{ .Arch }}").unwrap();
//! let vars = BTreeMap::from([
//!     ("Platform".to_string(), "linux".to_string()),
//!     ("Arch".to_string(), "amd64".to_string()),
//! ]);
//! assert_eq!(tmpl.render(&vars).unwrap(), "qri for linux/amd64");
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Variable(String),
}

/// Problems in the template text itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("malformed placeholder: {{{{{0}}}}}")]
  Malformed(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("failed to read template directory {}: {source}", path.display())]
  ReadDir { path: PathBuf, source: walkdir::Error },

  #[error("failed to read template {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("failed to parse template {name}: {source}")]
  Parse { name: String, source: SyntaxError },

  #[error("template not found: {name}")]
  NotFound { name: String },

  #[error("template {template} references unknown variable '{variable}'")]
  UnknownVariable { template: String, variable: String },
}

/// Parse template text into segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, SyntaxError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;
  let mut offset = 0;

  while let Some(start) = rest.find("{{") {
    literal.push_str(&rest[..start]);
    let after_open = &rest[start + 2..];

    if let Some(escaped) = after_open.strip_prefix("{{") {
      literal.push_str("{{");
      offset += start + 4;
      rest = escaped;
      continue;
    }

    let close = after_open.find("}}").ok_or(SyntaxError::Unclosed(offset + start))?;
    let content = &after_open[..close];

    if !literal.is_empty() {
      segments.push(Segment::Literal(std::mem::take(&mut literal)));
    }
    segments.push(Segment::Variable(parse_variable(content)?));

    let consumed = start + 2 + close + 2;
    offset += consumed;
    rest = &rest[consumed..];
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Parse the content between `{{` and `}}`; only `.Ident` is accepted.
fn parse_variable(content: &str) -> Result<String, SyntaxError> {
  let name = content
    .trim()
    .strip_prefix('.')
    .ok_or_else(|| SyntaxError::Malformed(content.to_string()))?;

  let valid = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
  if !valid {
    return Err(SyntaxError::Malformed(content.to_string()));
  }

  Ok(name.to_string())
}

/// A parsed, named template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  name: String,
  segments: Vec<Segment>,
}

impl Template {
  pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, SyntaxError> {
    Ok(Self {
      name: name.into(),
      segments: parse(source)?,
    })
  }

  /// Render with `vars`. Every referenced variable must be present.
  pub fn render(&self, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::new();
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Variable(name) => {
          let value = vars.get(name).ok_or_else(|| TemplateError::UnknownVariable {
            template: self.name.clone(),
            variable: name.clone(),
          })?;
          out.push_str(value);
        }
      }
    }
    Ok(out)
  }
}

/// Every template found directly inside one directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
  templates: BTreeMap<String, Template>,
}

impl TemplateSet {
  /// Load and parse every regular file directly inside `dir`.
  ///
  /// A file that fails to parse fails the whole load, even if it isn't the
  /// template that will be looked up later.
  pub fn load(dir: &Path) -> Result<Self, TemplateError> {
    let mut templates = BTreeMap::new();

    let walker = WalkDir::new(dir)
      .min_depth(1)
      .max_depth(1)
      .follow_links(true)
      .sort_by_file_name();

    for entry in walker {
      let entry = entry.map_err(|source| TemplateError::ReadDir {
        path: dir.to_path_buf(),
        source,
      })?;
      if !entry.file_type().is_file() {
        continue;
      }

      let path = entry.path();
      let name = entry.file_name().to_string_lossy().into_owned();
      let source = std::fs::read_to_string(path).map_err(|source| TemplateError::ReadFile {
        path: path.to_path_buf(),
        source,
      })?;
      let template = Template::parse(&name, &source).map_err(|source| TemplateError::Parse {
        name: name.clone(),
        source,
      })?;

      debug!(template = %name, "loaded template");
      templates.insert(name, template);
    }

    Ok(Self { templates })
  }

  pub fn get(&self, name: &str) -> Result<&Template, TemplateError> {
    self.templates.get(name).ok_or_else(|| TemplateError::NotFound {
      name: name.to_string(),
    })
  }
}
