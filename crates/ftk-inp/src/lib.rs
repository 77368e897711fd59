//! Keyword deck reader for frame models.
//!
//! A deck is a sequence of cards. Each card starts with a `*KEYWORD` header
//! carrying optional `KEY=VALUE` parameters, followed by comma-separated data
//! lines. Lines starting with `**` are comments.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub keyword: String,
    pub parameters: Vec<Parameter>,
    pub data_lines: Vec<DataLine>,
    /// 1-based line of the card header
    pub line_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

/// One data row with the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLine {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl Deck {
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ParseError::new(0, format!("failed to read {}: {e}", path.display())))?;
        Self::parse_str(&raw)
    }

    pub fn parse_str(raw: &str) -> Result<Self, ParseError> {
        let mut cards: Vec<Card> = Vec::new();

        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed) {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('*') {
                let (keyword, parameters) = parse_header(header, line_no)?;
                cards.push(Card {
                    keyword,
                    parameters,
                    data_lines: Vec::new(),
                    line_start: line_no,
                });
                continue;
            }

            let Some(card) = cards.last_mut() else {
                return Err(ParseError::new(line_no, "data line before the first card"));
            };

            // A leading comma right after the header continues the header.
            if trimmed.starts_with(',') && card.data_lines.is_empty() {
                let (_, extra) = parse_header(&format!("_{trimmed}"), line_no)?;
                card.parameters.extend(extra);
                continue;
            }

            card.data_lines.push(DataLine {
                line: line_no,
                text: trimmed.to_string(),
            });
        }

        Ok(Deck { cards })
    }

    /// Cards with the given keyword (case-insensitive), in file order.
    pub fn cards_named<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |c| c.is(keyword))
    }
}

impl Card {
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .and_then(|p| p.value.as_deref())
    }

    /// Parses a mandatory `KEY=VALUE` parameter.
    pub fn require<T: FromStr>(&self, key: &str) -> Result<T, ParseError> {
        let raw = self.parameter(key).ok_or_else(|| {
            ParseError::new(
                self.line_start,
                format!("*{} is missing {key}=", self.keyword),
            )
        })?;
        raw.parse::<T>().map_err(|_| {
            ParseError::new(
                self.line_start,
                format!("*{}: invalid value '{raw}' for {key}", self.keyword),
            )
        })
    }

    /// Parameters other than `known`, as key/value pairs.
    pub fn other_parameters(&self, known: &[&str]) -> Vec<(String, String)> {
        self.parameters
            .iter()
            .filter(|p| !known.iter().any(|k| p.key.eq_ignore_ascii_case(k)))
            .map(|p| (p.key.clone(), p.value.clone().unwrap_or_default()))
            .collect()
    }

    /// All fields of every data line, concatenated. Used for values that may
    /// wrap across lines.
    pub fn all_fields<T: FromStr>(&self) -> Result<Vec<T>, ParseError> {
        let mut out = Vec::new();
        for line in &self.data_lines {
            out.extend(line.parse_fields::<T>()?);
        }
        Ok(out)
    }
}

impl DataLine {
    /// Non-empty comma-separated fields.
    pub fn fields(&self) -> Vec<&str> {
        self.text
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }

    pub fn parse_fields<T: FromStr>(&self) -> Result<Vec<T>, ParseError> {
        self.fields()
            .into_iter()
            .map(|f| {
                f.parse::<T>()
                    .map_err(|_| ParseError::new(self.line, format!("invalid field '{f}'")))
            })
            .collect()
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("**")
}

fn parse_header(header: &str, line: usize) -> Result<(String, Vec<Parameter>), ParseError> {
    let mut parts = header.split(',');
    let keyword = parts.next().map(str::trim).unwrap_or_default();
    if keyword.is_empty() {
        return Err(ParseError::new(line, "empty card keyword"));
    }

    let parameters = parts
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once('=') {
            Some((k, v)) => Parameter {
                key: k.trim().to_ascii_uppercase(),
                value: Some(v.trim().to_string()),
            },
            None => Parameter {
                key: item.to_ascii_uppercase(),
                value: None,
            },
        })
        .collect();

    Ok((keyword.to_ascii_uppercase(), parameters))
}
