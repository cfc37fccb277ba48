//! Path templates with `{name}` placeholders.
//!
//! A template is literal text interspersed with `{name}` regions filled at
//! call time from path parameters or path properties. Matching is by exact
//! string equality of `name`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Error, Result};

/// Encode set for substituted path segments.
///
/// Encodes everything a raw path segment cannot carry while leaving the
/// unreserved characters (`A-Z a-z 0-9 - . _ ~`) intact.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// A path template such as `/accounts/{accountId}/users`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Create a new path template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Get the template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder names, in order of appearance, duplicates preserved.
    ///
    /// A placeholder is a maximal `{name}` substring whose `name` is a
    /// non-empty sequence of non-brace characters; an inner `{` restarts
    /// the placeholder. An unterminated `{` contributes nothing.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut placeholders = Vec::new();
        let mut rest = self.0.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            let segment = &after[..close];
            let name = segment.rfind('{').map_or(segment, |pos| &segment[pos + 1..]);
            if !name.is_empty() {
                placeholders.push(name);
            }
            rest = &after[close + 1..];
        }
        placeholders
    }

    /// Substitute every placeholder through `resolve`, percent-encoding the
    /// substituted values as path segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPathValue`] when `resolve` has no value for a
    /// placeholder.
    pub fn expand<'a, F>(&self, mut resolve: F) -> Result<String>
    where
        F: FnMut(&str) -> Option<std::borrow::Cow<'a, str>>,
    {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();
        while let Some(open) = rest.find('{') {
            let (literal, after) = rest.split_at(open);
            out.push_str(literal);
            let Some(close) = after.find('}') else {
                out.push_str(after);
                return Ok(out);
            };
            let segment = &after[1..close];
            // An inner `{` restarts the placeholder; everything before it
            // is literal text.
            let (prefix, name) = match segment.rfind('{') {
                Some(pos) => (&after[..=pos], &segment[pos + 1..]),
                None => ("", segment),
            };
            out.push_str(prefix);
            if name.is_empty() {
                out.push_str(&after[prefix.len()..=close]);
            } else {
                let value = resolve(name).ok_or_else(|| Error::MissingPathValue {
                    key: name.to_string(),
                })?;
                out.push_str(&utf8_percent_encode(&value, PATH_SEGMENT_ENCODE_SET).to_string());
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PathTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn placeholders_single() {
        let template = PathTemplate::new("/users/{id}");
        assert_eq!(template.placeholders(), vec!["id"]);
    }

    #[test]
    fn placeholders_multiple() {
        let template = PathTemplate::new("/repos/{owner}/{repo}/issues/{number}");
        assert_eq!(template.placeholders(), vec!["owner", "repo", "number"]);
    }

    #[test]
    fn placeholders_none() {
        assert!(PathTemplate::new("/health").placeholders().is_empty());
        assert!(PathTemplate::new("").placeholders().is_empty());
    }

    #[test]
    fn placeholders_duplicates_preserved() {
        let template = PathTemplate::new("/{x}/{x}");
        assert_eq!(template.placeholders(), vec!["x", "x"]);
    }

    #[test]
    fn placeholders_skip_empty_and_unterminated() {
        assert!(PathTemplate::new("/a/{}/b").placeholders().is_empty());
        assert!(PathTemplate::new("/a/{open").placeholders().is_empty());
        assert_eq!(PathTemplate::new("/{{a}").placeholders(), vec!["a"]);
    }

    #[test]
    fn placeholders_concatenation() {
        let a = PathTemplate::new("/accounts/{accountId}");
        let b = PathTemplate::new("/users/{userId}");
        let joined = PathTemplate::new(format!("{}{}", a.as_str(), b.as_str()));
        let mut expected = a.placeholders();
        expected.extend(b.placeholders());
        assert_eq!(joined.placeholders(), expected);
    }

    #[test]
    fn expand_substitutes() {
        let template = PathTemplate::new("/accounts/{accountId}/users");
        let path = template
            .expand(|key| (key == "accountId").then(|| Cow::Borrowed("A1")))
            .expect("expand");
        assert_eq!(path, "/accounts/A1/users");
    }

    #[test]
    fn expand_percent_encodes() {
        let template = PathTemplate::new("/files/{name}");
        let path = template
            .expand(|_| Some(Cow::Borrowed("a b/c")))
            .expect("expand");
        assert_eq!(path, "/files/a%20b%2Fc");
    }

    #[test]
    fn expand_missing_value() {
        let template = PathTemplate::new("/users/{id}");
        let err = template.expand(|_| None).expect_err("missing");
        assert!(matches!(err, Error::MissingPathValue { key } if key == "id"));
    }

    #[test]
    fn expand_leaves_literals_alone() {
        let template = PathTemplate::new("/a/{}/b/{open");
        let path = template
            .expand(|_| Some(Cow::Borrowed("x")))
            .expect("expand");
        assert_eq!(path, "/a/{}/b/{open");
    }
}
