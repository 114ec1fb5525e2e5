//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse route expressions (`"video_feed/"`, `"media/<uuid:id>/"`)
//! - Match a request path against a compiled pattern
//! - Capture typed path parameters as raw strings
//! - Build a URL back from a pattern and parameter values
//!
//! # Design Decisions
//! - Patterns are matched against the path without its leading `/`
//! - Matching is anchored at both ends (no implicit prefix match)
//! - No regex: converters are character predicates with backtracking
//! - Captured values are not percent-decoded

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Captured path parameters, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

/// Error raised while parsing a route expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route '{0}' must not start with '/'")]
    LeadingSlash(String),
    #[error("route '{0}' has an unterminated '<'")]
    Unterminated(String),
    #[error("route '{route}' uses unknown converter '{converter}'")]
    UnknownConverter { route: String, converter: String },
    #[error("route '{route}' has invalid parameter name '{name}'")]
    InvalidName { route: String, name: String },
    #[error("route '{route}' repeats parameter '{name}'")]
    DuplicateName { route: String, name: String },
}

/// Error raised when a URL cannot be built from a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
    #[error("missing value for parameter '{0}'")]
    Missing(String),
    #[error("value '{value}' does not satisfy converter '{converter}' for '{name}'")]
    Rejected {
        name: String,
        converter: Converter,
        value: String,
    },
    #[error("unexpected parameter '{0}'")]
    Unexpected(String),
}

/// Path converter applied to a captured segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    Str,
    Int,
    Slug,
    Uuid,
    Path,
}

impl Converter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Converter::Str),
            "int" => Some(Converter::Int),
            "slug" => Some(Converter::Slug),
            "uuid" => Some(Converter::Uuid),
            "path" => Some(Converter::Path),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Converter::Str => "str",
            Converter::Int => "int",
            Converter::Slug => "slug",
            Converter::Uuid => "uuid",
            Converter::Path => "path",
        }
    }

    fn accepts_char(self, c: char) -> bool {
        match self {
            Converter::Str => c != '/',
            Converter::Int => c.is_ascii_digit(),
            Converter::Slug => c.is_ascii_alphanumeric() || c == '-' || c == '_',
            Converter::Uuid => c.is_ascii_digit() || ('a'..='f').contains(&c) || c == '-',
            Converter::Path => true,
        }
    }

    /// Full-value check, used for both matching and reversing.
    pub fn accepts(self, value: &str) -> bool {
        if value.is_empty() || !value.chars().all(|c| self.accepts_char(c)) {
            return false;
        }
        match self {
            Converter::Uuid => {
                let groups: Vec<&str> = value.split('-').collect();
                groups.len() == 5
                    && groups
                        .iter()
                        .zip([8, 4, 4, 4, 12])
                        .all(|(g, len)| g.len() == len)
            }
            _ => true,
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// A compiled route expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a route expression such as `"articles/<int:year>/"`.
    pub fn parse(route: &str) -> Result<Self, PatternError> {
        if route.starts_with('/') {
            return Err(PatternError::LeadingSlash(route.to_string()));
        }

        let mut segments = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut rest = route;

        while !rest.is_empty() {
            match rest.find('<') {
                Some(0) => {
                    let end = rest
                        .find('>')
                        .ok_or_else(|| PatternError::Unterminated(route.to_string()))?;
                    let inner = &rest[1..end];
                    let (converter_name, name) = match inner.split_once(':') {
                        Some((c, n)) => (c, n),
                        None => ("str", inner),
                    };
                    let converter = Converter::from_name(converter_name).ok_or_else(|| {
                        PatternError::UnknownConverter {
                            route: route.to_string(),
                            converter: converter_name.to_string(),
                        }
                    })?;
                    if !is_identifier(name) {
                        return Err(PatternError::InvalidName {
                            route: route.to_string(),
                            name: name.to_string(),
                        });
                    }
                    if seen.iter().any(|s| s == name) {
                        return Err(PatternError::DuplicateName {
                            route: route.to_string(),
                            name: name.to_string(),
                        });
                    }
                    seen.push(name.to_string());
                    segments.push(Segment::Param {
                        name: name.to_string(),
                        converter,
                    });
                    rest = &rest[end + 1..];
                }
                Some(idx) => {
                    segments.push(Segment::Literal(rest[..idx].to_string()));
                    rest = &rest[idx..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        Ok(Self {
            raw: route.to_string(),
            segments,
        })
    }

    /// The expression this pattern was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters this pattern captures, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match `path` (without its leading `/`) against the whole pattern.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let mut params = Params::new();
        if match_from(&self.segments, path, &mut params) {
            Some(params)
        } else {
            None
        }
    }

    /// Build the absolute URL for this pattern from `params`.
    pub fn reverse(&self, params: &Params) -> Result<String, ReverseError> {
        if let Some(extra) = params
            .keys()
            .find(|k| !self.param_names().any(|n| n == k.as_str()))
        {
            return Err(ReverseError::Unexpected(extra.clone()));
        }

        let mut url = String::from("/");
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Param { name, converter } => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| ReverseError::Missing(name.clone()))?;
                    if !converter.accepts(value) {
                        return Err(ReverseError::Rejected {
                            name: name.clone(),
                            converter: *converter,
                            value: value.clone(),
                        });
                    }
                    url.push_str(value);
                }
            }
        }
        Ok(url)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn match_from(segments: &[Segment], path: &str, params: &mut Params) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return path.is_empty();
    };

    match first {
        Segment::Literal(text) => match path.strip_prefix(text.as_str()) {
            Some(remaining) => match_from(rest, remaining, params),
            None => false,
        },
        Segment::Param { name, converter } => {
            // Longest run of acceptable chars, then backtrack towards shorter captures.
            let run: usize = path
                .char_indices()
                .find(|(_, c)| !converter.accepts_char(*c))
                .map(|(i, _)| i)
                .unwrap_or(path.len());

            let mut ends: Vec<usize> = path[..run]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            ends.reverse();

            for end in ends {
                let value = &path[..end];
                if !converter.accepts(value) {
                    continue;
                }
                params.insert(name.clone(), value.to_string());
                if match_from(rest, &path[end..], params) {
                    return true;
                }
                params.remove(name);
            }
            false
        }
    }
}
