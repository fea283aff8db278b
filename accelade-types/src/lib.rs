//! Shared types for accelade
//!
//! This crate provides the identifiers used across the accelade ecosystem:
//! reactivity substrates, binding kinds and component identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Component identifier, taken from `data-accelade-id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reactivity back-end a component can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstrateId {
    /// Plain property interception; always available
    Vanilla,
    Vue,
    React,
    Svelte,
    Angular,
}

impl SubstrateId {
    /// Every known substrate, fallback first
    pub const ALL: [SubstrateId; 5] = [
        SubstrateId::Vanilla,
        SubstrateId::Vue,
        SubstrateId::React,
        SubstrateId::Svelte,
        SubstrateId::Angular,
    ];

    /// The substrate used when nothing else is detected
    pub const FALLBACK: SubstrateId = SubstrateId::Vanilla;

    /// Returns the lowercase identifier used in markup and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstrateId::Vanilla => "vanilla",
            SubstrateId::Vue => "vue",
            SubstrateId::React => "react",
            SubstrateId::Svelte => "svelte",
            SubstrateId::Angular => "angular",
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

impl fmt::Display for SubstrateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a substrate name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown substrate: {0}")]
pub struct UnknownSubstrate(pub String);

impl FromStr for SubstrateId {
    type Err = UnknownSubstrate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vanilla" | "accelade" => Ok(SubstrateId::Vanilla),
            "vue" => Ok(SubstrateId::Vue),
            "react" => Ok(SubstrateId::React),
            "svelte" => Ok(SubstrateId::Svelte),
            "angular" => Ok(SubstrateId::Angular),
            other => Err(UnknownSubstrate(other.to_string())),
        }
    }
}

/// The kind of DOM binding declared on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Text,
    Html,
    Show,
    If,
    Model,
    Attr,
    Class,
    Style,
    Event,
}

impl BindingKind {
    /// Returns the lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Text => "text",
            BindingKind::Html => "html",
            BindingKind::Show => "show",
            BindingKind::If => "if",
            BindingKind::Model => "model",
            BindingKind::Attr => "attr",
            BindingKind::Class => "class",
            BindingKind::Style => "style",
            BindingKind::Event => "event",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte range in an attribute expression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substrate_round_trip_names() {
        for id in SubstrateId::ALL {
            assert_eq!(id.as_str().parse::<SubstrateId>().unwrap(), id);
        }
    }

    #[test]
    fn test_substrate_parse_is_case_insensitive() {
        assert_eq!(" Vue ".parse::<SubstrateId>().unwrap(), SubstrateId::Vue);
        assert_eq!("accelade".parse::<SubstrateId>().unwrap(), SubstrateId::Vanilla);
        assert_eq!(
            "solid".parse::<SubstrateId>(),
            Err(UnknownSubstrate("solid".to_string()))
        );
    }

    #[test]
    fn test_fallback() {
        assert!(SubstrateId::Vanilla.is_fallback());
        assert!(!SubstrateId::Angular.is_fallback());
    }
}
