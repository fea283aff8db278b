//! Render functions for each binding kind
//!
//! A render takes a scope and brings one node in line with it. Renders are
//! built once per binding and re-run by whatever propagation model the
//! controller uses; they only touch the DOM when the result differs from
//! what is already there.

use super::actions::Actions;
use crate::expr::{interp::parse_float, Evaluator, Scope, Value};
use crate::store::StateStore;
use accelade_dom::{Document, DomResult, Event, Listener, NodeId};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value as Json;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::warn;

/// Re-evaluate a binding against a scope
pub type Render = Rc<dyn Fn(&dyn Scope)>;

static INTERPOLATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{\{\s*(.*?)\s*\}\}").expect("valid interpolation regex")
});

/// Whether `text` contains a `{{ expression }}`
pub fn has_interpolation(text: &str) -> bool {
    INTERPOLATION.is_match(text)
}

/// What every render of one controller shares
#[derive(Clone)]
pub struct RenderContext {
    pub document: Document,
    pub evaluator: Rc<Evaluator>,
    pub disposed: Rc<Cell<bool>>,
    pub placeholders: Rc<RefCell<HashMap<NodeId, NodeId>>>,
}

impl RenderContext {
    pub fn new(document: Document, evaluator: Rc<Evaluator>) -> Self {
        Self {
            document,
            evaluator,
            disposed: Rc::new(Cell::new(false)),
            placeholders: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

fn report(result: DomResult<()>, node: NodeId, kind: &str) {
    if let Err(err) = result {
        warn!(%node, kind, "Binding failed to update the DOM: {err}");
    }
}

// ===== Content =====

pub fn text(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let ctx = ctx.clone();
    let expression = expression.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let text = ctx.evaluator.evaluate_string(&expression, scope);
        if ctx.document.text_content(node) != text {
            report(ctx.document.set_text_content(node, &text), node, "text");
        }
    })
}

/// Inner markup, inserted as-is
pub fn html(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let ctx = ctx.clone();
    let expression = expression.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let markup = ctx.evaluator.evaluate_string(&expression, scope);
        if ctx.document.inner_html(node) != markup {
            report(ctx.document.set_inner_html(node, &markup), node, "html");
        }
    })
}

/// `{{ expression }}` segments of a text node
pub fn interpolation(ctx: &RenderContext, node: NodeId, template: &str) -> Render {
    let ctx = ctx.clone();
    let template = template.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let rendered = INTERPOLATION.replace_all(&template, |caps: &Captures| {
            ctx.evaluator.evaluate_string(&caps[1], scope)
        });
        if ctx.document.node_text(node).as_deref() != Some(&*rendered) {
            report(ctx.document.set_node_text(node, &rendered), node, "interpolation");
        }
    })
}

// ===== Visibility =====

/// Toggle `display: none`, restoring the element's own display otherwise
pub fn show(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let ctx = ctx.clone();
    let expression = expression.to_string();
    let original = ctx
        .document
        .style_property(node, "display")
        .filter(|display| display != "none");
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let visible = ctx.evaluator.evaluate_boolean(&expression, scope);
        let current = ctx.document.style_property(node, "display");
        let result = match (visible, &original) {
            (false, _) if current.as_deref() != Some("none") => {
                ctx.document.set_style_property(node, "display", "none")
            }
            (true, Some(display)) if current.as_ref() != Some(display) => {
                ctx.document.set_style_property(node, "display", display)
            }
            (true, None) if current.is_some() => {
                ctx.document.remove_style_property(node, "display")
            }
            _ => Ok(()),
        };
        report(result, node, "show");
    })
}

/// Swap the element with a comment placeholder
///
/// Exactly one of the pair is attached at any time. The placeholder is
/// created here and registered in the context's placeholder map.
pub fn conditional(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let placeholder = ctx
        .document
        .create_comment(&format!(" if: {} ", expression.trim()));
    ctx.placeholders.borrow_mut().insert(node, placeholder);

    let ctx = ctx.clone();
    let expression = expression.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let visible = ctx.evaluator.evaluate_boolean(&expression, scope);
        let Some(placeholder) = ctx.placeholders.borrow().get(&node).copied() else {
            return;
        };
        let doc = &ctx.document;
        let result = if visible {
            if doc.parent(node).is_none() && doc.parent(placeholder).is_some() {
                doc.replace_with(placeholder, node)
            } else {
                Ok(())
            }
        } else if doc.parent(node).is_some() {
            doc.replace_with(node, placeholder)
        } else {
            Ok(())
        };
        report(result, node, "if");
    })
}

// ===== Attributes =====

/// `attr:<name>`: `true` sets an empty attribute, `false` and nullish
/// values remove it, an object on `class` toggles classes
pub fn attr(ctx: &RenderContext, node: NodeId, name: &str, expression: &str) -> Render {
    let ctx = ctx.clone();
    let name = name.to_string();
    let expression = expression.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let doc = &ctx.document;
        let value = ctx.evaluator.evaluate(&expression, scope);
        let result = match value {
            Value::Bool(true) => set_if_changed(doc, node, &name, ""),
            Value::Bool(false) | Value::Null | Value::Undefined => {
                doc.remove_attribute(node, &name).map(|_| ())
            }
            Value::Object(entries) if name == "class" => entries.iter().try_for_each(|(names, on)| {
                names
                    .split_whitespace()
                    .try_for_each(|class| doc.toggle_class(node, class, on.truthy()))
            }),
            other => set_if_changed(doc, node, &name, &other.to_string()),
        };
        report(result, node, "attr");
    })
}

fn set_if_changed(doc: &Document, node: NodeId, name: &str, value: &str) -> DomResult<()> {
    if doc.get_attribute(node, name).as_deref() == Some(value) {
        return Ok(());
    }
    doc.set_attribute(node, name, value)
}

/// Per-class toggle; classes not named by the map are left alone
pub fn class(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let ctx = ctx.clone();
    let expression = expression.to_string();
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        for (class, on) in ctx.evaluator.evaluate_class_map(&expression, scope) {
            if ctx.document.has_class(node, &class) != on {
                report(ctx.document.toggle_class(node, &class, on), node, "class");
            }
        }
    })
}

/// One inline style property per entry; properties set by an earlier pass
/// and missing now are removed
pub fn style(ctx: &RenderContext, node: NodeId, expression: &str) -> Render {
    let ctx = ctx.clone();
    let expression = expression.to_string();
    let applied: RefCell<BTreeSet<String>> = RefCell::new(BTreeSet::new());
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let doc = &ctx.document;
        let entries = match ctx.evaluator.evaluate(&expression, scope) {
            Value::Object(entries) => entries,
            Value::Undefined | Value::Null => Vec::new(),
            other => {
                warn!(expression = %expression, "Style binding expects an object, got {}", other.type_name());
                Vec::new()
            }
        };

        let mut now = BTreeSet::new();
        for (property, value) in entries {
            if matches!(value, Value::Undefined | Value::Null | Value::Bool(false)) {
                report(doc.remove_style_property(node, &property), node, "style");
                continue;
            }
            let value = value.to_string();
            if doc.style_property(node, &property).as_deref() != Some(value.as_str()) {
                report(doc.set_style_property(node, &property, &value), node, "style");
            }
            now.insert(property);
        }
        for stale in applied.borrow().difference(&now) {
            report(doc.remove_style_property(node, stale), node, "style");
        }
        *applied.borrow_mut() = now;
    })
}

// ===== Forms =====

/// How a form control maps to state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Radio,
    Number,
    Select,
    Text,
}

impl ControlKind {
    pub fn of(doc: &Document, node: NodeId) -> Self {
        match doc.input_type(node).as_str() {
            "checkbox" => ControlKind::Checkbox,
            "radio" => ControlKind::Radio,
            "number" | "range" => ControlKind::Number,
            "select" => ControlKind::Select,
            _ => ControlKind::Text,
        }
    }

    /// The DOM event that carries user edits
    pub fn event(&self) -> &'static str {
        match self {
            ControlKind::Checkbox | ControlKind::Radio | ControlKind::Select => "change",
            ControlKind::Number | ControlKind::Text => "input",
        }
    }
}

/// State to DOM half of a model binding
pub fn model(ctx: &RenderContext, node: NodeId, key: &str) -> Render {
    let ctx = ctx.clone();
    let key = key.to_string();
    let control = ControlKind::of(&ctx.document, node);
    Rc::new(move |scope: &dyn Scope| {
        if ctx.is_disposed() {
            return;
        }
        let doc = &ctx.document;
        let value = ctx.evaluator.evaluate(&key, scope);
        let result = match control {
            ControlKind::Checkbox => {
                let checked = value.truthy();
                if doc.checked(node) != checked {
                    doc.set_checked(node, checked)
                } else {
                    Ok(())
                }
            }
            ControlKind::Radio => {
                let checked = !value.is_nullish() && value.to_string() == doc.value(node);
                if doc.checked(node) != checked {
                    doc.set_checked(node, checked)
                } else {
                    Ok(())
                }
            }
            ControlKind::Number | ControlKind::Select | ControlKind::Text => {
                let text = if value.is_nullish() {
                    String::new()
                } else {
                    value.to_string()
                };
                if doc.value(node) != text {
                    doc.set_value(node, &text)
                } else {
                    Ok(())
                }
            }
        };
        report(result, node, "model");
    })
}

/// DOM to state half of a model binding: the value a control writes
pub fn read_control(doc: &Document, node: NodeId, control: ControlKind) -> Option<Json> {
    match control {
        ControlKind::Checkbox => Some(Json::Bool(doc.checked(node))),
        ControlKind::Radio => doc.checked(node).then(|| Json::String(doc.value(node))),
        ControlKind::Number => {
            let n = parse_float(&doc.value(node));
            let n = if n.is_finite() { n } else { 0.0 };
            Value::Number(n).to_json()
        }
        ControlKind::Select | ControlKind::Text => Some(Json::String(doc.value(node))),
    }
}

pub fn model_listener(
    ctx: &RenderContext,
    node: NodeId,
    key: &str,
    store: Rc<dyn StateStore>,
) -> Listener {
    let ctx = ctx.clone();
    let key = key.to_string();
    let control = ControlKind::of(&ctx.document, node);
    Rc::new(move |_event: &Event| {
        if ctx.is_disposed() {
            return;
        }
        if let Some(value) = read_control(&ctx.document, node, control) {
            store.set(&key, value);
        }
    })
}

// ===== Events =====

/// Native listener invoking a handler; supports the `prevent`, `stop` and
/// `self` modifiers
pub fn event_listener(
    ctx: &RenderContext,
    actions: Rc<Actions>,
    store: Rc<dyn StateStore>,
    handler: &str,
    modifiers: &[String],
) -> Listener {
    let disposed = ctx.disposed.clone();
    let handler = handler.to_string();
    let has = |name: &str| modifiers.iter().any(|m| m == name);
    let (prevent, stop, only_self) = (has("prevent"), has("stop"), has("self"));

    Rc::new(move |event: &Event| {
        if disposed.get() {
            return;
        }
        if only_self && event.target != event.current_target() {
            return;
        }
        if prevent {
            event.prevent_default();
        }
        if stop {
            event.stop_propagation();
        }
        actions.invoke(&handler, store.as_ref(), Some(event));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(value: Json) -> crate::path::State {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn setup(html: &str) -> (RenderContext, NodeId) {
        let doc = Document::new();
        let nodes = doc.append_html(doc.body(), html).unwrap();
        (RenderContext::new(doc, Rc::new(Evaluator::default())), nodes[0])
    }

    #[test]
    fn test_text_and_interpolation() {
        let (ctx, node) = setup("<p>Count: {{ count }} / {{ total * 2 }}</p>");
        let text_node = ctx.document.children(node)[0];
        let render = interpolation(&ctx, text_node, "Count: {{ count }} / {{ total * 2 }}");
        render(&scope(json!({"count": 0, "total": 2})));
        assert_eq!(ctx.document.text_content(node), "Count: 0 / 4");

        let render = text(&ctx, node, "missing");
        render(&scope(json!({})));
        assert_eq!(ctx.document.text_content(node), "");
    }

    #[test]
    fn test_show_restores_own_display() {
        let (ctx, node) = setup(r#"<div style="display: flex">x</div>"#);
        let render = show(&ctx, node, "open");
        render(&scope(json!({"open": false})));
        assert_eq!(ctx.document.style_property(node, "display").as_deref(), Some("none"));
        render(&scope(json!({"open": true})));
        assert_eq!(ctx.document.style_property(node, "display").as_deref(), Some("flex"));
    }

    #[test]
    fn test_conditional_keeps_exactly_one_attached() {
        let (ctx, node) = setup("<section>body</section>");
        let render = conditional(&ctx, node, "visible");
        let placeholder = ctx.placeholders.borrow()[&node];
        for visible in [false, false, true, true, false, true] {
            render(&scope(json!({ "visible": visible })));
            let element_in = ctx.document.parent(node).is_some();
            let placeholder_in = ctx.document.parent(placeholder).is_some();
            assert_ne!(element_in, placeholder_in);
            assert_eq!(element_in, visible);
        }
        assert_eq!(ctx.document.children(ctx.document.body()), vec![node]);
    }

    #[test]
    fn test_attr_rules() {
        let (ctx, node) = setup(r#"<button class="btn">Go</button>"#);
        let disabled = attr(&ctx, node, "disabled", "busy");
        let title = attr(&ctx, node, "title", "label");
        let classes = attr(&ctx, node, "class", "{ active: busy }");

        let state = scope(json!({"busy": true, "label": 42}));
        disabled(&state);
        title(&state);
        classes(&state);
        assert_eq!(ctx.document.get_attribute(node, "disabled").as_deref(), Some(""));
        assert_eq!(ctx.document.get_attribute(node, "title").as_deref(), Some("42"));
        assert!(ctx.document.has_class(node, "active"));
        assert!(ctx.document.has_class(node, "btn"));

        let state = scope(json!({"busy": false}));
        disabled(&state);
        title(&state);
        classes(&state);
        assert!(!ctx.document.has_attribute(node, "disabled"));
        assert!(!ctx.document.has_attribute(node, "title"));
        assert!(!ctx.document.has_class(node, "active"));
        assert!(ctx.document.has_class(node, "btn"));
    }

    #[test]
    fn test_style_entries() {
        let (ctx, node) = setup("<div></div>");
        let render = style(&ctx, node, "{ color: color, '--size': size + 'px' }");
        render(&scope(json!({"color": "red", "size": 4})));
        assert_eq!(ctx.document.style_property(node, "color").as_deref(), Some("red"));
        assert_eq!(ctx.document.style_property(node, "--size").as_deref(), Some("4px"));
        render(&scope(json!({"color": null, "size": 5})));
        assert_eq!(ctx.document.style_property(node, "color"), None);
        assert_eq!(ctx.document.style_property(node, "--size").as_deref(), Some("5px"));
    }

    #[test]
    fn test_number_controls_write_zero_for_junk() {
        let (ctx, node) = setup(r#"<input type="number">"#);
        ctx.document.set_value(node, "abc").unwrap();
        assert_eq!(read_control(&ctx.document, node, ControlKind::Number), Some(json!(0)));
        ctx.document.set_value(node, "2.5").unwrap();
        assert_eq!(read_control(&ctx.document, node, ControlKind::Number), Some(json!(2.5)));
        ctx.document.set_value(node, "2.5abc").unwrap();
        assert_eq!(read_control(&ctx.document, node, ControlKind::Number), Some(json!(2.5)));
        ctx.document.set_value(node, "").unwrap();
        assert_eq!(read_control(&ctx.document, node, ControlKind::Number), Some(json!(0)));
        assert_eq!(ControlKind::of(&ctx.document, node).event(), "input");
    }

    #[test]
    fn test_checkbox_model_is_boolean_both_ways() {
        let (ctx, node) = setup(r#"<input type="checkbox" value="b">"#);
        let render = model(&ctx, node, "tags");
        render(&scope(json!({"tags": ["a"]})));
        assert!(ctx.document.checked(node));
        render(&scope(json!({"tags": ""})));
        assert!(!ctx.document.checked(node));

        ctx.document.set_checked(node, true).unwrap();
        assert_eq!(read_control(&ctx.document, node, ControlKind::Checkbox), Some(json!(true)));
        render(&scope(json!({"tags": true})));
        assert!(ctx.document.checked(node));
    }

    #[test]
    fn test_disposed_context_stops_rendering() {
        let (ctx, node) = setup("<p>old</p>");
        let render = text(&ctx, node, "'new'");
        ctx.disposed.set(true);
        render(&scope(json!({})));
        assert_eq!(ctx.document.text_content(node), "old");
    }
}
