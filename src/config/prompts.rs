//! Prompt templates for PersonaLearn.
//!
//! The query prompt can be replaced with a plain text file. Lines starting with
//! `#` in that file are treated as comments and dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub query: QueryPrompts,
}

/// Prompt used to turn a confusing transcript excerpt into a search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPrompts {
    pub template: String,
}

impl Default for QueryPrompts {
    fn default() -> Self {
        Self {
            template: r#"A student is watching a lecture video and got confused by part of it.
Write a short YouTube search query that would find a video explaining the concept the student is stuck on.
Answer with the query only.

Video title: Introduction to Algorithms, Lecture 3: Insertion Sort, Merge Sort
Transcript: so the recurrence here is T of n equals two T of n over two plus theta n and if we draw the recursion tree each level does a linear amount of work
Query: merge sort recursion tree running time explained

Video title: Linear Algebra, Lecture 14: Orthogonal Vectors and Subspaces
Transcript: the null space is orthogonal to the row space so every vector in the null space has a zero dot product with every row
Query: why null space is orthogonal to row space

Video title: {{video_title}}
Transcript: {{transcript}}
Query:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Read a prompt template file, stripping `#` comment lines.
    pub fn read_template(path: &Path) -> crate::error::Result<String> {
        let content = std::fs::read_to_string(path)?;
        Ok(strip_comments(&content))
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single left-to-right pass, so values
    /// are never scanned for further placeholders. Unknown `{{name}}`
    /// placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let substitution = after
                .find("}}")
                .and_then(|close| vars.get(&after[..close]).map(|value| (close, value)));

            match substitution {
                Some((close, value)) => {
                    result.push_str(value);
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }
}

/// Drop every line that starts with `#`.
pub(crate) fn strip_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}
