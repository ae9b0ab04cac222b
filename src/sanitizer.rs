//! Candidate source sanitization.
//!
//! Reduces a Python module to its top-level imports and function/class
//! definitions without executing any of it. Statement boundaries come from
//! the interpreter's own parser through a [`SourceParser`], so a source that
//! does not parse is rejected here rather than at load time. Kept statements
//! are cut out of the original text by their spans, which splits
//! `import a; x = f()` at the `;` and drops trailing comments.

use crate::config::types::SanitizationError;
use crate::core::types::{NodeKind, SourceNode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Parses a module into top-level statement spans without running it.
pub trait SourceParser {
    fn parse_module(&self, source: &str) -> Result<Vec<SourceNode>, SanitizationError>;
}

/// Kind of a kept top-level definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Class,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
}

/// Sanitized candidate code. Always holds at least one definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub sanitized: String,
    pub definitions: Vec<Definition>,
    /// Every function in `sanitized`, methods and nested ones included, in
    /// source order
    pub functions: Vec<String>,
    pub imports: usize,
    /// Hex SHA-256 of `sanitized`
    pub digest: String,
}

/// Keep only imports and function/class definitions (with their decorators).
pub fn sanitize<P>(parser: &P, code: &str) -> Result<CodeArtifact, SanitizationError>
where
    P: SourceParser + ?Sized,
{
    let normalized = code.replace("\r\n", "\n").replace('\r', "\n");
    let nodes = parser.parse_module(&normalized)?;
    let lines: Vec<&str> = normalized.split('\n').collect();

    let mut kept = Vec::new();
    let mut definitions = Vec::new();
    let mut functions = Vec::new();
    let mut imports = 0;

    for node in &nodes {
        let kind = match node.kind {
            NodeKind::Other => continue,
            NodeKind::Import => None,
            NodeKind::Function => Some(DefinitionKind::Function),
            NodeKind::Class => Some(DefinitionKind::Class),
        };
        let text = render(&lines, node).ok_or_else(|| {
            SanitizationError::Parser(format!(
                "statement span {}:{}-{}:{} outside the source",
                node.line, node.col, node.end_line, node.end_col
            ))
        })?;
        match kind {
            Some(kind) => {
                definitions.push(Definition {
                    name: node.name.clone().unwrap_or_default(),
                    kind,
                });
                functions.extend(node.functions.iter().cloned());
            }
            None => imports += 1,
        }
        kept.push(text);
    }

    if definitions.is_empty() {
        return Err(SanitizationError::NoDefinitions);
    }

    let sanitized = kept.join("\n");
    let digest = format!("{:x}", Sha256::digest(sanitized.as_bytes()));
    log::debug!(
        "sanitized candidate: {} of {} statements kept ({} definitions, {} imports), {} -> {} bytes",
        kept.len(),
        nodes.len(),
        definitions.len(),
        imports,
        code.len(),
        sanitized.len()
    );

    Ok(CodeArtifact {
        sanitized,
        definitions,
        functions,
        imports,
        digest,
    })
}

/// Name of the first function in the artifact, nested ones included.
pub fn extract_function_name(artifact: &CodeArtifact) -> Result<String, SanitizationError> {
    artifact
        .functions
        .first()
        .cloned()
        .ok_or(SanitizationError::NoFunction)
}

/// Source text of one statement, trailing whitespace removed
fn render(lines: &[&str], node: &SourceNode) -> Option<String> {
    let first = node.line.checked_sub(1)?;
    let last = node.end_line.checked_sub(1)?;
    let span = lines.get(first..=last)?;

    let mut pieces = Vec::with_capacity(span.len());
    for (offset, line) in span.iter().enumerate() {
        let from = if offset == 0 { node.col } else { 0 };
        let to = if offset + 1 == span.len() {
            node.end_col
        } else {
            line.len()
        };
        pieces.push(line.get(from..to)?);
    }
    Some(pieces.join("\n").trim_end().to_string())
}
