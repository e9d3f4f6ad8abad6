//! Element selectors.
//!
//! A deliberately small selector language covering what storefront themes
//! use to mark cart surfaces: `#id`, `.class`, `[attr=value]`, bare tag
//! names, and comma-separated alternatives of those.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Errors produced while parsing a selector.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
	#[error("Empty selector")]
	Empty,
	#[error("Unsupported selector: {0}")]
	Unsupported(String),
}

/// Anything a selector can be matched against.
pub trait Matchable {
	/// Lower-case tag name.
	fn tag(&self) -> &str;
	/// Attribute value, if the attribute is present.
	fn attribute(&self, name: &str) -> Option<&str>;
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
	Id(String),
	Class(String),
	Attribute { name: String, value: String },
	Tag(String),
	Any(Vec<Selector>),
}

impl Selector {
	pub fn id(id: impl Into<String>) -> Self {
		Selector::Id(id.into())
	}

	pub fn class(class: impl Into<String>) -> Self {
		Selector::Class(class.into())
	}

	/// `[name=value]`, the convention themes use for submit controls.
	pub fn name(value: impl Into<String>) -> Self {
		Selector::Attribute {
			name: "name".to_string(),
			value: value.into(),
		}
	}

	pub fn matches<M: Matchable + ?Sized>(&self, element: &M) -> bool {
		match self {
			Selector::Id(id) => element.attribute("id") == Some(id.as_str()),
			Selector::Class(class) => element
				.attribute("class")
				.is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
			Selector::Attribute { name, value } => element.attribute(name) == Some(value.as_str()),
			Selector::Tag(tag) => element.tag().eq_ignore_ascii_case(tag),
			Selector::Any(alternatives) => alternatives.iter().any(|s| s.matches(element)),
		}
	}

	fn parse_simple(part: &str) -> Result<Self, SelectorError> {
		if let Some(id) = part.strip_prefix('#') {
			return non_empty(id).map(Selector::id);
		}
		if let Some(class) = part.strip_prefix('.') {
			return non_empty(class).map(Selector::class);
		}
		if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
			let (name, value) = inner
				.split_once('=')
				.ok_or_else(|| SelectorError::Unsupported(part.to_string()))?;
			let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
			return Ok(Selector::Attribute {
				name: non_empty(name.trim())?.to_string(),
				value: value.to_string(),
			});
		}
		if part
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		{
			return non_empty(part).map(|tag| Selector::Tag(tag.to_ascii_lowercase()));
		}
		Err(SelectorError::Unsupported(part.to_string()))
	}
}

fn non_empty(s: &str) -> Result<&str, SelectorError> {
	if s.is_empty() {
		Err(SelectorError::Empty)
	} else {
		Ok(s)
	}
}

impl FromStr for Selector {
	type Err = SelectorError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s
			.split(',')
			.map(str::trim)
			.map(|part| {
				if part.is_empty() {
					Err(SelectorError::Empty)
				} else {
					Self::parse_simple(part)
				}
			})
			.collect::<Result<Vec<_>, _>>()?;
		match parts.len() {
			0 => Err(SelectorError::Empty),
			1 => Ok(parts.remove(0)),
			_ => Ok(Selector::Any(parts)),
		}
	}
}

impl TryFrom<String> for Selector {
	type Error = SelectorError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Selector> for String {
	fn from(selector: Selector) -> Self {
		selector.to_string()
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Selector::Id(id) => write!(f, "#{id}"),
			Selector::Class(class) => write!(f, ".{class}"),
			Selector::Attribute { name, value } => write!(f, "[{name}=\"{value}\"]"),
			Selector::Tag(tag) => f.write_str(tag),
			Selector::Any(alternatives) => {
				for (i, alternative) in alternatives.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{alternative}")?;
				}
				Ok(())
			},
		}
	}
}
