//! Path string to [`JsonPath`] AST.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a path string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// `[` without a matching `]`.
    #[error("unterminated bracket in path '{0}'")]
    UnterminatedBracket(String),
    /// A quoted name without its closing quote.
    #[error("unterminated quote in path '{0}'")]
    UnterminatedQuote(String),
    /// `[]` or a union with nothing in it.
    #[error("empty selector in path '{0}'")]
    EmptySelector(String),
}

/// Inclusive-start, exclusive-end, stepped array range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub step: Option<i64>,
}

/// What a child segment picks out of each node in the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every member or item.
    Wildcard,
    /// One object member, matched case-sensitively.
    Member(String),
    /// One array item; negative counts from the end.
    Index(i64),
    /// A range of array items.
    Slice(Slice),
    /// Several selectors applied in order and concatenated.
    Union(Vec<Selector>),
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `..`: the frontier plus everything beneath it.
    Descendants,
    /// `.name`, `*`, or a bracket expression.
    Child(Selector),
}

/// A parsed path query.
///
/// # Examples
///
/// ```rust
/// use aznaming::jsonpath::{JsonPath, Segment, Selector};
///
/// let path: JsonPath = "$.templates['my template']".parse().unwrap();
/// assert_eq!(
///     path.segments(),
///     &[
///         Segment::Child(Selector::Member("templates".into())),
///         Segment::Child(Selector::Member("my template".into())),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse `path`.
    ///
    /// # Errors
    ///
    /// Fails on unbalanced brackets or quotes and on empty bracket expressions.
    pub fn parse(path: &str) -> Result<Self, PathParseError> {
        let segments = parse_segments(path)?;
        Ok(Self {
            source: path.to_string(),
            segments,
        })
    }

    /// Parsed segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The text this path was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(path: &str) -> Result<Vec<Segment>, PathParseError> {
    let mut segments = Vec::new();
    let mut rest = path.trim();
    rest = rest.strip_prefix('$').unwrap_or(rest);

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("..") {
            segments.push(Segment::Descendants);
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('.') {
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('*') {
            segments.push(Segment::Child(Selector::Wildcard));
            rest = after;
            continue;
        }
        if rest.starts_with('[') {
            let (content, after) = split_bracket(rest).map_err(|kind| kind.into_error(path))?;
            segments.push(Segment::Child(parse_bracket(content, path)?));
            rest = after;
            continue;
        }

        let end = rest.find(['.', '[']).unwrap_or(rest.len());
        let (name, after) = rest.split_at(end);
        segments.push(Segment::Child(parse_unquoted(name.trim())));
        rest = after;
    }

    Ok(segments)
}

/// Failure while scanning a bracket, before the path text is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BracketError {
    Unterminated,
    UnterminatedQuote,
}

impl BracketError {
    fn into_error(self, path: &str) -> PathParseError {
        match self {
            Self::Unterminated => PathParseError::UnterminatedBracket(path.to_string()),
            Self::UnterminatedQuote => PathParseError::UnterminatedQuote(path.to_string()),
        }
    }
}

/// Split `[content]rest` into `(content, rest)`.
///
/// Brackets inside quotes do not count; a doubled quote is an escaped quote.
pub(crate) fn split_bracket(text: &str) -> Result<(&str, &str), BracketError> {
    let body = text.strip_prefix('[').ok_or(BracketError::Unterminated)?;
    let mut quote: Option<char> = None;
    let mut chars = body.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek().is_some_and(|&(_, next)| next == q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ']' => return Ok((&body[..index], &body[index + 1..])),
            None => {}
        }
    }

    if quote.is_some() {
        Err(BracketError::UnterminatedQuote)
    } else {
        Err(BracketError::Unterminated)
    }
}

/// Split a bracket body on commas that are not inside quotes.
fn split_union(content: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek().is_some_and(|&(_, next)| next == q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                items.push(&content[start..index]);
                start = index + 1;
            }
            None => {}
        }
    }
    items.push(&content[start..]);
    items
}

/// If `item` is wrapped in matching quotes, return the unescaped name.
pub(crate) fn unquote(item: &str) -> Option<String> {
    let mut chars = item.chars();
    let first = chars.next()?;
    if (first != '\'' && first != '"') || item.len() < 2 || !item.ends_with(first) {
        return None;
    }
    let inner = &item[1..item.len() - 1];
    let doubled = format!("{first}{first}");
    Some(inner.replace(&doubled, &first.to_string()))
}

fn parse_bracket(content: &str, path: &str) -> Result<Selector, PathParseError> {
    let mut selectors: Vec<Selector> = split_union(content)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| unquote(item).map_or_else(|| parse_unquoted(item), Selector::Member))
        .collect();

    match selectors.len() {
        0 => Err(PathParseError::EmptySelector(path.to_string())),
        1 => Ok(selectors.remove(0)),
        _ => Ok(Selector::Union(selectors)),
    }
}

fn parse_unquoted(item: &str) -> Selector {
    if item == "*" {
        return Selector::Wildcard;
    }
    if let Ok(index) = item.parse::<i64>() {
        return Selector::Index(index);
    }
    if item.contains(':') {
        let mut parts = item.splitn(3, ':').map(|part| part.trim().parse::<i64>().ok());
        return Selector::Slice(Slice {
            start: parts.next().flatten(),
            end: parts.next().flatten(),
            step: parts.next().flatten(),
        });
    }
    Selector::Member(item.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(selector: Selector) -> Segment {
        Segment::Child(selector)
    }

    fn member(name: &str) -> Segment {
        child(Selector::Member(name.to_string()))
    }

    #[test]
    fn test_dotted_members() {
        let path = JsonPath::parse("$.a.b").unwrap();
        assert_eq!(path.segments(), &[member("a"), member("b")]);
    }

    #[test]
    fn test_root_only() {
        assert!(JsonPath::parse("$").unwrap().segments().is_empty());
    }

    #[test]
    fn test_descendants_and_wildcard() {
        let path = JsonPath::parse("$..*").unwrap();
        assert_eq!(path.segments(), &[Segment::Descendants, child(Selector::Wildcard)]);

        let path = JsonPath::parse("$..name").unwrap();
        assert_eq!(path.segments(), &[Segment::Descendants, member("name")]);
    }

    #[test]
    fn test_quoted_members_with_escapes() {
        let path = JsonPath::parse("$['it''s', \"a.b\"]").unwrap();
        assert_eq!(
            path.segments(),
            &[child(Selector::Union(vec![
                Selector::Member("it's".into()),
                Selector::Member("a.b".into()),
            ]))]
        );
    }

    #[test]
    fn test_quoted_bracket_characters_do_not_close() {
        let path = JsonPath::parse("$['a]b'].c").unwrap();
        assert_eq!(path.segments(), &[member("a]b"), member("c")]);
    }

    #[test]
    fn test_index_and_slices() {
        let path = JsonPath::parse("$.items[-1][1:3][::-1][a:]").unwrap();
        assert_eq!(
            path.segments(),
            &[
                member("items"),
                child(Selector::Index(-1)),
                child(Selector::Slice(Slice { start: Some(1), end: Some(3), step: None })),
                child(Selector::Slice(Slice { start: None, end: None, step: Some(-1) })),
                child(Selector::Slice(Slice::default())),
            ]
        );
    }

    #[test]
    fn test_bare_numeric_member_is_index() {
        let path = JsonPath::parse("$.list.0").unwrap();
        assert_eq!(path.segments(), &[member("list"), child(Selector::Index(0))]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(JsonPath::parse("$.a[0"), Err(PathParseError::UnterminatedBracket(_))));
        assert!(matches!(JsonPath::parse("$['a]"), Err(PathParseError::UnterminatedQuote(_))));
        assert!(matches!(JsonPath::parse("$[]"), Err(PathParseError::EmptySelector(_))));
    }

    #[test]
    fn test_split_bracket_returns_rest() {
        assert_eq!(split_bracket("['x']['y']"), Ok(("'x'", "['y']")));
    }
}
