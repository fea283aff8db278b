//! Binding expression language
//!
//! Attribute strings such as `count > 0 && !loading` or
//! `{ active: tab === 'home' }` are parsed once, cached, and evaluated
//! against a [`Scope`] on every render. Plain dotted paths (`user.name`)
//! skip the parser entirely and resolve by direct traversal.
//!
//! Evaluation is read-only and sandboxed: the language has no assignment,
//! no user-defined functions and no access to anything outside the scope
//! and a small set of pure builtins. Failures never escape the
//! [`Evaluator`] wrappers; they are logged and degrade to an empty value.

pub mod ast;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::Expr;
pub use value::Value;

use crate::config::{AcceladeConfig, DEFAULT_EXPRESSION_CACHE_SIZE};
use crate::path::State;
use accelade_types::Span;
use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;
use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("Lexer error at {}..{}: {message}", span.start, span.end)]
    Lex { span: Span, message: String },

    #[error("Parse error at {}..{}: {message}", span.start, span.end)]
    Parse { span: Span, message: String },

    #[error("{0} is not defined")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("Only plain property paths are allowed: {0}")]
    Forbidden(String),
}

pub type Result<T> = std::result::Result<T, ExprError>;

// ===== Scopes =====

/// Name resolution for free variables of an expression
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Json>;
}

impl Scope for State {
    fn lookup(&self, name: &str) -> Option<Json> {
        self.get(name).cloned()
    }
}

/// Scope with no variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Option<Json> {
        None
    }
}

/// Extra names layered over a parent scope, e.g. `$event` in handlers
pub struct Locals<'a> {
    parent: &'a dyn Scope,
    vars: Vec<(String, Json)>,
}

impl<'a> Locals<'a> {
    pub fn new(parent: &'a dyn Scope) -> Self {
        Self {
            parent,
            vars: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Json) -> Self {
        self.vars.push((name.into(), value));
        self
    }
}

impl Scope for Locals<'_> {
    fn lookup(&self, name: &str) -> Option<Json> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.parent.lookup(name))
    }
}

// ===== Evaluator =====

static SIMPLE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*$").expect("valid path regex")
});

/// Identifiers that look like paths but denote literals
const LITERAL_WORDS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

/// Whether `source` is a plain dotted property path
pub fn is_simple_path(source: &str) -> bool {
    if !SIMPLE_PATH.is_match(source) {
        return false;
    }
    let root = source.split('.').next().unwrap_or_default();
    !LITERAL_WORDS.contains(&root) && root != "typeof"
}

/// Caching expression evaluator
///
/// One evaluator is shared by every controller on a page.
pub struct Evaluator {
    cache: RefCell<LruCache<String, Rc<Expr>>>,
    strict: bool,
}

impl Evaluator {
    pub fn new(cache_size: usize, strict: bool) -> Self {
        let capacity = NonZeroUsize::new(cache_size)
            .or_else(|| NonZeroUsize::new(DEFAULT_EXPRESSION_CACHE_SIZE))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RefCell::new(LruCache::new(capacity)),
            strict,
        }
    }

    pub fn from_config(config: &AcceladeConfig) -> Self {
        Self::new(config.expression_cache_size, config.strict_expressions)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Number of parsed expressions currently cached
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Parse `source`, reusing a cached tree when available
    pub fn parse(&self, source: &str) -> Result<Rc<Expr>> {
        if let Some(expr) = self.cache.borrow_mut().get(source) {
            return Ok(Rc::clone(expr));
        }
        let expr = Rc::new(parser::parse(source)?);
        self.cache
            .borrow_mut()
            .put(source.to_string(), Rc::clone(&expr));
        Ok(expr)
    }

    /// Evaluate, surfacing failures to the caller
    pub fn try_evaluate(&self, source: &str, scope: &dyn Scope) -> Result<Value> {
        let source = source.trim();
        if is_simple_path(source) {
            return Ok(interp::resolve_path(source, scope));
        }
        if self.strict {
            return Err(ExprError::Forbidden(source.to_string()));
        }
        let expr = self.parse(source)?;
        interp::eval(&expr, scope)
    }

    /// Evaluate; failures are logged and yield `undefined`
    pub fn evaluate(&self, source: &str, scope: &dyn Scope) -> Value {
        match self.try_evaluate(source, scope) {
            Ok(value) => value,
            Err(err) => {
                warn!(expression = %source, "Expression evaluation failed: {err}");
                Value::Undefined
            }
        }
    }

    pub fn evaluate_boolean(&self, source: &str, scope: &dyn Scope) -> bool {
        self.evaluate(source, scope).truthy()
    }

    /// String form for text bindings; `undefined` and `null` render empty
    pub fn evaluate_string(&self, source: &str, scope: &dyn Scope) -> String {
        match self.evaluate(source, scope) {
            Value::Undefined | Value::Null => String::new(),
            value => value.to_string(),
        }
    }

    /// Class name to enabled map
    ///
    /// An object result maps each key (split on whitespace, so
    /// `{'a b': on}` toggles both) to the truthiness of its value. Anything
    /// else, including a failed evaluation, is taken as one literal class
    /// name switched on.
    pub fn evaluate_class_map(&self, source: &str, scope: &dyn Scope) -> Vec<(String, bool)> {
        let source = source.trim();
        match self.try_evaluate(source, scope) {
            Ok(Value::Object(entries)) => entries
                .into_iter()
                .flat_map(|(names, value)| {
                    let on = value.truthy();
                    names
                        .split_whitespace()
                        .map(|name| (name.to_string(), on))
                        .collect::<Vec<_>>()
                })
                .collect(),
            _ if source.is_empty() => Vec::new(),
            _ => vec![(source.to_string(), true)],
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_EXPRESSION_CACHE_SIZE, false)
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("cached", &self.cached_len())
            .field("strict", &self.strict)
            .finish()
    }
}

// ===== Free functions over a default evaluator =====

thread_local! {
    static DEFAULT_EVALUATOR: Evaluator = Evaluator::default();
}

/// Evaluate with the thread's default evaluator
pub fn evaluate(source: &str, scope: &dyn Scope) -> Value {
    DEFAULT_EVALUATOR.with(|e| e.evaluate(source, scope))
}

pub fn evaluate_boolean(source: &str, scope: &dyn Scope) -> bool {
    DEFAULT_EVALUATOR.with(|e| e.evaluate_boolean(source, scope))
}

pub fn evaluate_string(source: &str, scope: &dyn Scope) -> String {
    DEFAULT_EVALUATOR.with(|e| e.evaluate_string(source, scope))
}

pub fn evaluate_class_map(source: &str, scope: &dyn Scope) -> Vec<(String, bool)> {
    DEFAULT_EVALUATOR.with(|e| e.evaluate_class_map(source, scope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Json) -> State {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_fast_path_detection() {
        assert!(is_simple_path("count"));
        assert!(is_simple_path("user.profile.email"));
        assert!(is_simple_path("$event.detail"));
        assert!(!is_simple_path("true"));
        assert!(!is_simple_path("undefined"));
        assert!(!is_simple_path("a + b"));
        assert!(!is_simple_path("items[0]"));
    }

    #[test]
    fn test_division_by_zero_and_missing_paths() {
        let e = Evaluator::default();
        assert_eq!(e.evaluate("1/0", &EmptyScope), Value::Number(f64::INFINITY));
        assert_eq!(e.evaluate("x.y.z", &EmptyScope), Value::Undefined);
    }

    #[test]
    fn test_failures_degrade_to_empty_values() {
        let e = Evaluator::default();
        let s = state(json!({"a": null}));
        assert_eq!(e.evaluate("a.b.c + 1", &s), Value::Undefined);
        assert!(!e.evaluate_boolean("nope > 1", &s));
        assert_eq!(e.evaluate_string("(", &s), "");
        assert_eq!(e.evaluate_string("a", &s), "");
    }

    #[test]
    fn test_typed_wrappers() {
        let e = Evaluator::default();
        let s = state(json!({"count": 0, "name": "Ada", "ok": true}));
        assert_eq!(e.evaluate_string("count", &s), "0");
        assert_eq!(e.evaluate_string("`x`", &s), "");
        assert_eq!(e.evaluate_string("name + '!'", &s), "Ada!");
        assert!(e.evaluate_boolean("ok && count === 0", &s));
    }

    #[test]
    fn test_class_map() {
        let e = Evaluator::default();
        let s = state(json!({"active": true, "busy": 0}));
        assert_eq!(
            e.evaluate_class_map("{ 'is-active font-bold': active, busy: busy }", &s),
            vec![
                ("is-active".to_string(), true),
                ("font-bold".to_string(), true),
                ("busy".to_string(), false),
            ]
        );
        assert_eq!(
            e.evaluate_class_map(" highlighted ", &s),
            vec![("highlighted".to_string(), true)]
        );
    }

    #[test]
    fn test_parse_cache_is_bounded() {
        let e = Evaluator::new(2, false);
        let s = State::new();
        e.evaluate("1 + 1", &s);
        e.evaluate("1 + 1", &s);
        assert_eq!(e.cached_len(), 1);
        e.evaluate("2 + 2", &s);
        e.evaluate("3 + 3", &s);
        assert_eq!(e.cached_len(), 2);
    }

    #[test]
    fn test_plain_paths_skip_the_cache() {
        let e = Evaluator::default();
        e.evaluate("user.name", &EmptyScope);
        assert_eq!(e.cached_len(), 0);
    }

    #[test]
    fn test_strict_mode_rejects_general_expressions() {
        let e = Evaluator::new(8, true);
        let s = state(json!({"count": 2}));
        assert_eq!(e.evaluate("count", &s), Value::Number(2.0));
        assert!(matches!(
            e.try_evaluate("count + 1", &s),
            Err(ExprError::Forbidden(_))
        ));
    }

    #[test]
    fn test_locals_shadow_parent() {
        let s = state(json!({"x": 1, "y": 2}));
        let locals = Locals::new(&s).with("x", json!(10));
        assert_eq!(evaluate("x + y", &locals), Value::Number(12.0));
    }
}
