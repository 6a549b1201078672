//! Route path patterns
//!
//! A pattern is a `/`-separated list of segments. Each segment is either
//! static text or a parameter written `:name`, optionally constrained by a
//! regular expression written in parentheses: `:id(\d+)`.
//!
//! Matching rules:
//! - static segments compare ASCII case-insensitively
//! - a parameter never matches an empty segment
//! - parameter values are percent-decoded before the constraint is checked

use regex::Regex;
use std::collections::HashMap;

use super::error::{RouteError, RouteResult};

/// One segment of a parsed pattern
#[derive(Debug, Clone)]
pub enum Segment {
    /// Literal text
    Static(String),
    /// Named parameter with an optional value constraint
    Param {
        name: String,
        constraint: Option<Constraint>,
    },
}

/// Regular expression a parameter value must match in full
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
    /// Same expression, case-insensitive; static segments match in any case
    folded: Regex,
}

impl Constraint {
    fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        let folded = Regex::new(&format!("(?i)^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
            folded,
        })
    }

    /// Check a decoded value against the constraint
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Whether some case variant of `text` satisfies the constraint
    pub fn accepts_any_case(&self, text: &str) -> bool {
        self.folded.is_match(text)
    }

    /// The constraint as written in the pattern
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A parsed route path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern such as `/service/:id(\d+)`
    pub fn parse(raw: &str) -> RouteResult<Self> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut seen_params: Vec<&str> = Vec::new();

        for part in split_path(raw) {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }

            let segment = classify_segment(part).map_err(|reason| invalid(&reason))?;
            if let Segment::Param { name, .. } = &segment {
                if seen_params.contains(&name.as_str()) {
                    return Err(invalid(&format!("parameter :{} declared twice", name)));
                }
                seen_params.push(part_name(part));
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern has no parameters
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    /// Names of all parameters in declaration order
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// Match already-split path segments, returning decoded parameters
    pub fn matches(&self, parts: &[&str]) -> Option<HashMap<String, String>> {
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Static(text) => {
                    if !text.eq_ignore_ascii_case(part) {
                        return None;
                    }
                }
                Segment::Param { name, constraint } => {
                    if part.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(part).ok()?.into_owned();
                    if let Some(c) = constraint {
                        if !c.is_match(&value) {
                            return None;
                        }
                    }
                    params.insert(name.clone(), value);
                }
            }
        }

        Some(params)
    }

    /// Build a concrete path from parameter values
    pub fn build(&self, params: &HashMap<String, String>) -> RouteResult<String> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(text) => path.push_str(text),
                Segment::Param { name, constraint } => {
                    let value = params
                        .get(name)
                        .filter(|v| !v.is_empty())
                        .ok_or_else(|| RouteError::MissingParam {
                            pattern: self.raw.clone(),
                            param: name.clone(),
                        })?;
                    if let Some(c) = constraint {
                        if !c.is_match(value) {
                            return Err(RouteError::InvalidParam {
                                param: name.clone(),
                                value: value.clone(),
                                constraint: c.as_str().to_string(),
                            });
                        }
                    }
                    path.push_str(&urlencoding::encode(value));
                }
            }
        }

        Ok(path)
    }

    /// Whether some concrete path could be matched by both patterns
    ///
    /// Parameters are assumed to overlap each other; a constrained parameter
    /// overlaps a static segment only if the constraint accepts that text in
    /// some letter case.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&other.segments)
            .all(|pair| match pair {
                (Segment::Static(a), Segment::Static(b)) => a.eq_ignore_ascii_case(b),
                (Segment::Static(text), Segment::Param { constraint, .. })
                | (Segment::Param { constraint, .. }, Segment::Static(text)) => constraint
                    .as_ref()
                    .map_or(true, |c| c.accepts_any_case(text)),
                (Segment::Param { .. }, Segment::Param { .. }) => true,
            })
    }
}

fn part_name(part: &str) -> &str {
    let name = part.trim_start_matches(':');
    name.split('(').next().unwrap_or(name)
}

fn classify_segment(part: &str) -> Result<Segment, String> {
    let Some(rest) = part.strip_prefix(':') else {
        if part.contains('(') || part.contains(')') {
            return Err(format!("unexpected parenthesis in static segment {:?}", part));
        }
        return Ok(Segment::Static(part.to_string()));
    };

    let (name, constraint) = match rest.split_once('(') {
        Some((name, tail)) => {
            let source = tail
                .strip_suffix(')')
                .ok_or_else(|| format!("unclosed constraint in {:?}", part))?;
            if source.is_empty() {
                return Err(format!("empty constraint in {:?}", part));
            }
            let constraint = Constraint::new(source).map_err(|e| e.to_string())?;
            (name, Some(constraint))
        }
        None => (rest, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid parameter name in {:?}", part));
    }

    Ok(Segment::Param {
        name: name.to_string(),
        constraint,
    })
}

/// Split a path (without query or fragment) into segments
///
/// The leading slash and a single trailing slash are ignored, so `/` yields
/// no segments and `/map/` yields `["map"]`.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_static() {
        let p = PathPattern::parse("/service/build_from_cache").unwrap();
        assert!(p.is_static());
        assert_eq!(p.segments().len(), 2);

        let root = PathPattern::parse("/").unwrap();
        assert!(root.segments().is_empty());
    }

    #[test]
    fn test_parse_params() {
        let p = PathPattern::parse(r"/robots/:id(\d+)/logs/:kind").unwrap();
        assert!(!p.is_static());
        assert_eq!(p.param_names(), vec!["id", "kind"]);
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        assert!(PathPattern::parse("map").is_err());
        assert!(PathPattern::parse("/a//b").is_err());
        assert!(PathPattern::parse("/:").is_err());
        assert!(PathPattern::parse("/:id(").is_err());
        assert!(PathPattern::parse("/:id()").is_err());
        assert!(PathPattern::parse("/:id/:id").is_err());
        assert!(PathPattern::parse("/:id([)").is_err());
    }

    #[test]
    fn test_match_static_case_insensitive() {
        let p = PathPattern::parse("/task-query").unwrap();
        assert!(p.matches(&["task-query"]).is_some());
        assert!(p.matches(&["Task-Query"]).is_some());
        assert!(p.matches(&["task-query", "x"]).is_none());
        assert!(p.matches(&[]).is_none());
    }

    #[test]
    fn test_match_params_decoded_and_constrained() {
        let p = PathPattern::parse(r"/robots/:id(\d+)").unwrap();
        let m = p.matches(&["robots", "42"]).unwrap();
        assert_eq!(m.get("id").map(String::as_str), Some("42"));
        assert!(p.matches(&["robots", "abc"]).is_none());
        assert!(p.matches(&["robots", ""]).is_none());

        let p = PathPattern::parse("/maps/:name").unwrap();
        let m = p.matches(&["maps", "floor%201"]).unwrap();
        assert_eq!(m.get("name").map(String::as_str), Some("floor 1"));
    }

    #[test]
    fn test_build() {
        let p = PathPattern::parse("/maps/:name").unwrap();
        assert_eq!(
            p.build(&params(&[("name", "floor 1")])).unwrap(),
            "/maps/floor%201"
        );
        assert!(matches!(
            p.build(&HashMap::new()),
            Err(RouteError::MissingParam { .. })
        ));

        let p = PathPattern::parse(r"/robots/:id(\d+)").unwrap();
        assert!(matches!(
            p.build(&params(&[("id", "x")])),
            Err(RouteError::InvalidParam { .. })
        ));

        let root = PathPattern::parse("/").unwrap();
        assert_eq!(root.build(&HashMap::new()).unwrap(), "/");
    }

    #[test]
    fn test_overlaps() {
        let a = PathPattern::parse("/service/:page").unwrap();
        let b = PathPattern::parse("/service/build_from_raw").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = PathPattern::parse(r"/service/:id(\d+)").unwrap();
        assert!(!c.overlaps(&b));

        let d = PathPattern::parse("/service").unwrap();
        assert!(!d.overlaps(&b));

        let g = PathPattern::parse("/:x(MAP)").unwrap();
        assert!(g.overlaps(&PathPattern::parse("/map").unwrap()));

        let e = PathPattern::parse("/MAP").unwrap();
        let f = PathPattern::parse("/map").unwrap();
        assert!(e.overlaps(&f));
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
        assert_eq!(split_path("/map/"), vec!["map"]);
        assert_eq!(split_path("/a/b"), vec!["a", "b"]);
        assert_eq!(split_path("/a//b"), vec!["a", "", "b"]);
    }
}
