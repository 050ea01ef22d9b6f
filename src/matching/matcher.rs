//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile path patterns (`a/:id`, `""`, `**`) into token lists
//! - Match a pattern against the remaining URL, extracting params
//! - Stringify a params map back into a concrete path
//!
//! # Design Decisions
//! - Three match kinds: full (consume everything), partial (prefix,
//!   leftover goes to descendants), any (`**` catch-all)
//! - Named params are always present as keys in the result map, `None`
//!   when the segment was absent, so consumers can rely on key presence
//! - No regex: tokenized segment walk, O(n) in URL length

use crate::errors::RouterError;
use std::collections::HashMap;

/// How much of the remaining URL a pattern must consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Match only if the entire remaining URL is consumed.
    Full,
    /// Match a prefix; the leftover is returned for descendants.
    Partial,
    /// Catch-all (`**`): always matches, consumes everything.
    Any,
}

/// Params extracted by a match: every declared name is present, `None`
/// when its segment was absent.
pub type Params = HashMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// Result of matching a pattern against a URL remainder.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Whether the pattern matched.
    pub matched: bool,
    /// Extracted params (`None` when unmatched).
    pub params: Option<Params>,
    /// URL consumed by ancestors, passed through for key derivation.
    pub parent_url: String,
    /// The fragment this pattern consumed, with a leading slash.
    pub segment: String,
    /// Leftover URL for descendants (empty when fully consumed).
    pub remaining: String,
}

impl MatchOutcome {
    fn unmatched(parent_url: &str, url: &str) -> Self {
        Self {
            matched: false,
            params: None,
            parent_url: parent_url.to_string(),
            segment: String::new(),
            remaining: url.to_string(),
        }
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    kind: MatchKind,
    pattern: String,
    tokens: Vec<Token>,
}

impl PathMatcher {
    /// Compile a pattern. `**` always compiles to the catch-all kind.
    pub fn new(pattern: impl Into<String>, kind: MatchKind) -> Self {
        let pattern = pattern.into();
        let kind = if pattern == "**" { MatchKind::Any } else { kind };
        let tokens = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != "**")
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Token::Param(name.to_string()),
                None => Token::Literal(s.to_string()),
            })
            .collect();
        Self {
            kind,
            pattern,
            tokens,
        }
    }

    /// Full matcher: the URL must be entirely consumed.
    pub fn full(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchKind::Full)
    }

    /// Partial matcher: prefix match, leftover for descendants.
    pub fn partial(pattern: impl Into<String>) -> Self {
        Self::new(pattern, MatchKind::Partial)
    }

    /// Catch-all matcher.
    pub fn any() -> Self {
        Self::new("**", MatchKind::Any)
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Declared parameter names, in pattern order.
    pub fn param_names(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Param(name) => Some(name.as_str()),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// Match this pattern against the remaining URL. `parent_url` is the
    /// portion already consumed by ancestors.
    pub fn match_against(&self, parent_url: &str, url: &str) -> MatchOutcome {
        let segments: Vec<&str> = url.split('/').filter(|s| !s.is_empty()).collect();

        if self.kind == MatchKind::Any {
            return MatchOutcome {
                matched: true,
                params: Some(Params::new()),
                parent_url: parent_url.to_string(),
                segment: join_segments(&segments),
                remaining: String::new(),
            };
        }

        let mut params = Params::new();
        for name in self.param_names() {
            params.insert(name.to_string(), None);
        }

        let mut consumed = 0usize;
        for token in &self.tokens {
            if consumed < segments.len() {
                match token {
                    Token::Literal(lit) => {
                        if lit != segments[consumed] {
                            return MatchOutcome::unmatched(parent_url, url);
                        }
                    }
                    Token::Param(name) => {
                        params.insert(name.clone(), Some(segments[consumed].to_string()));
                    }
                }
                consumed += 1;
            } else {
                // Trailing params may be absent; trailing literals may not.
                if let Token::Literal(_) = token {
                    return MatchOutcome::unmatched(parent_url, url);
                }
            }
        }

        let rest = &segments[consumed..];
        if self.kind == MatchKind::Full && !rest.is_empty() {
            return MatchOutcome::unmatched(parent_url, url);
        }

        MatchOutcome {
            matched: true,
            params: Some(params),
            parent_url: parent_url.to_string(),
            segment: join_segments(&segments[..consumed]),
            remaining: join_segments(rest),
        }
    }

    /// Inverse of matching: build a concrete path from a params map.
    /// Fails for the catch-all matcher and for missing non-trailing params.
    pub fn stringify(&self, params: &Params) -> Result<String, RouterError> {
        if self.kind == MatchKind::Any {
            return Err(RouterError::Stringify {
                pattern: self.pattern.clone(),
                reason: "catch-all patterns have no concrete form".into(),
            });
        }
        let mut segments: Vec<&str> = Vec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(lit) => segments.push(lit),
                Token::Param(name) => match params.get(name.as_str()).and_then(|v| v.as_deref()) {
                    Some(value) => segments.push(value),
                    None => {
                        let tail_ok = self.tokens[i..].iter().all(|t| match t {
                            Token::Param(n) => {
                                params.get(n.as_str()).and_then(|v| v.as_ref()).is_none()
                            }
                            Token::Literal(_) => false,
                        });
                        if tail_ok {
                            break;
                        }
                        return Err(RouterError::Stringify {
                            pattern: self.pattern.clone(),
                            reason: format!("missing value for param ':{name}'"),
                        });
                    }
                },
            }
        }
        Ok(join_segments_owned(&segments))
    }
}

fn join_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        String::new()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn join_segments_owned(segments: &[&str]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
