//! Markup conventions: which attribute names declare which bindings

use accelade_types::{BindingKind, SubstrateId};

/// An attribute name pattern `prefix<name>suffix`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrPattern {
    pub prefix: String,
    pub suffix: String,
}

impl AttrPattern {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// The `<name>` part of `attribute`, if it matches
    pub fn strip<'a>(&self, attribute: &'a str) -> Option<&'a str> {
        attribute
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn format(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

/// What an attribute declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// One of the fixed-name kinds (`text`, `html`, `show`, `if`, `model`,
    /// `class`, `style`)
    Binding(BindingKind),

    /// `attr:<name>`
    Attr(String),

    /// An event listener with its dot-separated modifiers
    Event { name: String, modifiers: Vec<String> },
}

/// Attribute vocabulary of one substrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupConvention {
    pub substrate: SubstrateId,

    /// Prefix of the fixed-name binding attributes, e.g. `a-`
    pub prefix: String,

    /// Event listener patterns, e.g. `@click` or `(click)`
    pub events: Vec<AttrPattern>,

    /// Attribute binding patterns, e.g. `:title` or `[title]`
    pub attrs: Vec<AttrPattern>,

    /// Attribute marking a component's custom script tag
    pub script_attribute: String,

    /// Attribute hiding markup until the first render
    pub cloak_attribute: String,

    /// Attribute name for each fixed-name binding kind
    pub bindings: Vec<(BindingKind, String)>,
}

const FIXED_KINDS: [BindingKind; 7] = [
    BindingKind::Text,
    BindingKind::Html,
    BindingKind::Show,
    BindingKind::If,
    BindingKind::Model,
    BindingKind::Class,
    BindingKind::Style,
];

impl MarkupConvention {
    /// Convention where every fixed-name binding is `<prefix><kind>`
    pub fn prefixed(substrate: SubstrateId, prefix: &str) -> Self {
        Self {
            substrate,
            prefix: prefix.to_string(),
            events: Vec::new(),
            attrs: Vec::new(),
            script_attribute: format!("{}script", prefix),
            cloak_attribute: format!("{}cloak", prefix),
            bindings: FIXED_KINDS
                .iter()
                .map(|kind| (*kind, format!("{}{}", prefix, kind)))
                .collect(),
        }
    }

    pub fn with_event(mut self, prefix: &str, suffix: &str) -> Self {
        self.events.push(AttrPattern::new(prefix, suffix));
        self
    }

    pub fn with_attr(mut self, prefix: &str, suffix: &str) -> Self {
        self.attrs.push(AttrPattern::new(prefix, suffix));
        self
    }

    /// Override the attribute name of one kind
    pub fn with_binding(mut self, kind: BindingKind, attribute: &str) -> Self {
        match self.bindings.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = attribute.to_string(),
            None => self.bindings.push((kind, attribute.to_string())),
        }
        self
    }

    // ===== Built-in conventions =====

    pub fn vanilla() -> Self {
        Self::prefixed(SubstrateId::Vanilla, "a-")
            .with_event("@", "")
            .with_event("a-on:", "")
            .with_attr("a-bind:", "")
    }

    pub fn vue() -> Self {
        Self::prefixed(SubstrateId::Vue, "v-")
            .with_event("@", "")
            .with_event("v-on:", "")
            .with_attr(":", "")
            .with_attr("v-bind:", "")
    }

    pub fn react() -> Self {
        Self::prefixed(SubstrateId::React, "data-state-")
            .with_event("data-on-", "")
            .with_attr("data-bind-", "")
    }

    pub fn svelte() -> Self {
        Self::prefixed(SubstrateId::Svelte, "s-")
            .with_event("on:", "")
            .with_attr("s-bind:", "")
    }

    pub fn angular() -> Self {
        Self::prefixed(SubstrateId::Angular, "ng-")
            .with_event("(", ")")
            .with_attr("[", "]")
            .with_binding(BindingKind::If, "*ngIf")
    }

    pub fn for_substrate(substrate: SubstrateId) -> Self {
        match substrate {
            SubstrateId::Vanilla => Self::vanilla(),
            SubstrateId::Vue => Self::vue(),
            SubstrateId::React => Self::react(),
            SubstrateId::Svelte => Self::svelte(),
            SubstrateId::Angular => Self::angular(),
        }
    }

    // ===== Queries =====

    /// Attribute name declaring `kind`
    pub fn attribute_for(&self, kind: BindingKind) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }

    /// CSS selector of the custom script tag
    pub fn script_selector(&self) -> String {
        format!("script[{}]", self.script_attribute)
    }

    /// Classify an attribute name; `None` for anything that declares nothing
    pub fn classify(&self, attribute: &str) -> Option<Declaration> {
        if let Some((kind, _)) = self.bindings.iter().find(|(_, name)| name == attribute) {
            return Some(Declaration::Binding(*kind));
        }

        if let Some(spec) = self.events.iter().find_map(|p| p.strip(attribute)) {
            let mut parts = spec.split('.');
            let name = parts.next().unwrap_or_default().to_string();
            if name.is_empty() {
                return None;
            }
            return Some(Declaration::Event {
                name,
                modifiers: parts.map(str::to_string).collect(),
            });
        }

        self.attrs
            .iter()
            .find_map(|p| p.strip(attribute))
            .map(|name| Declaration::Attr(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_vocabulary() {
        let c = MarkupConvention::vanilla();
        assert_eq!(c.classify("a-text"), Some(Declaration::Binding(BindingKind::Text)));
        assert_eq!(c.classify("a-if"), Some(Declaration::Binding(BindingKind::If)));
        assert_eq!(
            c.classify("@click.prevent"),
            Some(Declaration::Event {
                name: "click".into(),
                modifiers: vec!["prevent".into()],
            })
        );
        assert_eq!(c.classify("a-bind:title"), Some(Declaration::Attr("title".into())));
        assert_eq!(c.classify("a-unknown"), None);
        assert_eq!(c.classify("class"), None);
        assert_eq!(c.script_selector(), "script[a-script]");
        assert_eq!(c.cloak_attribute, "a-cloak");
    }

    #[test]
    fn test_angular_brackets() {
        let c = MarkupConvention::angular();
        assert_eq!(c.classify("*ngIf"), Some(Declaration::Binding(BindingKind::If)));
        assert_eq!(c.classify("ng-if"), None);
        assert_eq!(c.classify("ng-model"), Some(Declaration::Binding(BindingKind::Model)));
        assert_eq!(c.classify("[title]"), Some(Declaration::Attr("title".into())));
        assert_eq!(
            c.classify("(click)"),
            Some(Declaration::Event {
                name: "click".into(),
                modifiers: vec![],
            })
        );
        assert_eq!(c.classify("()"), None);
    }

    #[test]
    fn test_vue_shorthands() {
        let c = MarkupConvention::vue();
        assert_eq!(c.classify(":href"), Some(Declaration::Attr("href".into())));
        assert_eq!(c.classify("v-bind:href"), Some(Declaration::Attr("href".into())));
        assert!(matches!(c.classify("v-on:submit"), Some(Declaration::Event { name, .. }) if name == "submit"));
        assert_eq!(c.classify("v-show"), Some(Declaration::Binding(BindingKind::Show)));
    }

    #[test]
    fn test_react_data_attributes() {
        let c = MarkupConvention::react();
        assert_eq!(c.classify("data-state-if"), Some(Declaration::Binding(BindingKind::If)));
        assert_eq!(c.classify("data-bind-disabled"), Some(Declaration::Attr("disabled".into())));
        assert!(matches!(c.classify("data-on-input"), Some(Declaration::Event { name, .. }) if name == "input"));
        assert_eq!(c.classify("data-state"), None);
    }
}
