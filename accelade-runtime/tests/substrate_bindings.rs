//! Binding behavior that every substrate must share

use accelade_dom::{Document, Event, NodeId, NodeType};
use accelade_runtime::adapter::{Adapter, BuiltinAdapter, HostEnvironment, MarkupConvention};
use accelade_runtime::binding::{Binding, BindingController};
use accelade_runtime::expr::Scope;
use accelade_runtime::store::StateStore;
use accelade_types::{BindingKind, SubstrateId};
use serde_json::{json, Value as Json};
use std::cell::Cell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    doc: Document,
    store: Rc<dyn StateStore>,
    controller: Box<dyn BindingController>,
    root: NodeId,
}

impl Fixture {
    fn child(&self, index: usize) -> NodeId {
        self.doc.children(self.root)[index]
    }
}

fn attribute(substrate: SubstrateId, kind: BindingKind) -> String {
    MarkupConvention::for_substrate(substrate)
        .attribute_for(kind)
        .unwrap()
        .to_string()
}

fn event_attribute(substrate: SubstrateId, event: &str) -> String {
    MarkupConvention::for_substrate(substrate).events[0].format(event)
}

fn mount(substrate: SubstrateId, html: &str, state: Json) -> Fixture {
    init_tracing();
    let doc = Document::new();
    let root = doc.append_html(doc.body(), html).unwrap()[0];
    let env = HostEnvironment::new(doc.clone());
    let adapter = BuiltinAdapter::new(substrate);

    let store = adapter.create_state_store();
    let Json::Object(state) = state else {
        panic!("state must be an object");
    };
    store.init(state);
    let controller = adapter.create_binding_controller(&env);
    controller.init(root, store.clone()).unwrap();
    Fixture {
        doc,
        store,
        controller,
        root,
    }
}

#[test]
fn test_text_binding_follows_state() {
    for substrate in SubstrateId::ALL {
        let text = attribute(substrate, BindingKind::Text);
        let f = mount(substrate, &format!(r#"<div><span {text}="count"></span></div>"#), json!({"count": 0}));
        let span = f.child(0);
        assert_eq!(f.doc.text_content(span), "0", "{substrate}");

        f.store.set("count", json!(5));
        assert_eq!(f.doc.text_content(span), "5", "{substrate}");
    }
}

#[test]
fn test_interpolation_and_attributes() {
    for substrate in SubstrateId::ALL {
        let attr = MarkupConvention::for_substrate(substrate).attrs[0].format("title");
        let f = mount(
            substrate,
            &format!(r#"<div><p {attr}="name + '!'">Hello {{{{ name }}}}, {{{{ n * 2 }}}}</p></div>"#),
            json!({"name": "Ada", "n": 2}),
        );
        let p = f.child(0);
        assert_eq!(f.doc.text_content(p), "Hello Ada, 4", "{substrate}");
        assert_eq!(f.doc.get_attribute(p, "title").as_deref(), Some("Ada!"));

        let mut updates = serde_json::Map::new();
        updates.insert("name".into(), json!("Grace"));
        updates.insert("n".into(), json!(5));
        f.store.set_many(updates);
        assert_eq!(f.doc.text_content(p), "Hello Grace, 10", "{substrate}");
        assert_eq!(f.doc.get_attribute(p, "title").as_deref(), Some("Grace!"));
    }
}

#[test]
fn test_conditional_swaps_with_placeholder() {
    for substrate in SubstrateId::ALL {
        let cond = attribute(substrate, BindingKind::If);
        let f = mount(substrate, &format!(r#"<div><p {cond}="visible">hi</p></div>"#), json!({"visible": false}));
        let p = f
            .controller
            .core()
            .bindings()
            .iter()
            .find(|b| b.kind == BindingKind::If)
            .map(|b| b.node)
            .unwrap();
        let placeholder = f.controller.core().placeholder(p).unwrap();

        assert!(!f.doc.is_connected(p), "{substrate}");
        assert_eq!(f.doc.children(f.root), vec![placeholder]);
        assert_eq!(f.doc.node_type(placeholder), Some(NodeType::Comment));

        f.store.set("visible", json!(true));
        assert_eq!(f.doc.children(f.root), vec![p], "{substrate}");

        for visible in [true, false, false, true, false] {
            f.store.set("visible", json!(visible));
            assert_ne!(f.doc.is_connected(p), f.doc.is_connected(placeholder));
            assert_eq!(f.doc.is_connected(p), visible, "{substrate}");
            assert_eq!(f.doc.children(f.root).len(), 1);
        }
    }
}

#[test]
fn test_show_class_and_style() {
    for substrate in SubstrateId::ALL {
        let show = attribute(substrate, BindingKind::Show);
        let class = attribute(substrate, BindingKind::Class);
        let style = attribute(substrate, BindingKind::Style);
        let f = mount(
            substrate,
            &format!(
                r#"<div><p {show}="open" {class}="{{ active: open, 'is-big': size > 2 }}" {style}="{{ '--size': size + 'px' }}" class="keep">x</p></div>"#
            ),
            json!({"open": false, "size": 1}),
        );
        let p = f.child(0);
        assert_eq!(f.doc.style_property(p, "display").as_deref(), Some("none"), "{substrate}");
        assert!(!f.doc.has_class(p, "active"));
        assert_eq!(f.doc.style_property(p, "--size").as_deref(), Some("1px"));

        f.store.set("open", json!(true));
        f.store.set("size", json!(3));
        assert_eq!(f.doc.style_property(p, "display"), None, "{substrate}");
        assert!(f.doc.has_class(p, "active") && f.doc.has_class(p, "is-big") && f.doc.has_class(p, "keep"));
        assert_eq!(f.doc.style_property(p, "--size").as_deref(), Some("3px"));
    }
}

#[test]
fn test_html_binding_sets_inner_markup() {
    for substrate in SubstrateId::ALL {
        let html = attribute(substrate, BindingKind::Html);
        let f = mount(
            substrate,
            &format!(r#"<div><div {html}="markup">old</div></div>"#),
            json!({"markup": "<i>x</i>"}),
        );
        let target = f.child(0);
        assert_eq!(f.doc.inner_html(target), "<i>x</i>", "{substrate}");

        f.store.set("markup", json!("<b>y</b> z"));
        assert_eq!(f.doc.inner_html(target), "<b>y</b> z", "{substrate}");
    }
}

#[test]
fn test_radio_model_writes_the_selected_value() {
    for substrate in SubstrateId::ALL {
        let model = attribute(substrate, BindingKind::Model);
        let f = mount(
            substrate,
            &format!(r#"<div><input type="radio" value="s" {model}="size"><input type="radio" value="m" {model}="size"></div>"#),
            json!({"size": "s"}),
        );
        let (small, medium) = (f.child(0), f.child(1));
        assert!(f.doc.checked(small), "{substrate}");
        assert!(!f.doc.checked(medium), "{substrate}");

        f.doc.set_checked(medium, true).unwrap();
        f.doc.dispatch(medium, "change");
        assert_eq!(f.store.get("size"), Some(json!("m")), "{substrate}");
        assert!(!f.doc.checked(small), "{substrate}");
        assert!(f.doc.checked(medium), "{substrate}");
    }
}

#[test]
fn test_set_many_renders_once_on_coalescing_substrates() {
    for substrate in [SubstrateId::Vanilla, SubstrateId::React, SubstrateId::Svelte] {
        let f = mount(substrate, "<div></div>", json!({"a": 0, "b": 0, "c": 0}));
        let passes = Rc::new(Cell::new(0));
        let p = passes.clone();
        f.controller.install(Binding {
            node: f.root,
            kind: BindingKind::Text,
            expression: "a + b + c".to_string(),
            render: Rc::new(move |_: &dyn Scope| p.set(p.get() + 1)),
        });
        passes.set(0);

        let mut updates = serde_json::Map::new();
        for key in ["a", "b", "c"] {
            updates.insert(key.into(), json!(1));
        }
        f.store.set_many(updates);
        assert_eq!(passes.get(), 1, "{substrate}");

        f.store.set("a", json!(2));
        assert_eq!(passes.get(), 2, "{substrate}");
    }
}

#[test]
fn test_checkbox_model_writes_booleans_once() {
    for substrate in SubstrateId::ALL {
        let model = attribute(substrate, BindingKind::Model);
        let f = mount(
            substrate,
            &format!(r#"<div><input type="checkbox" {model}="agreed"></div>"#),
            json!({"agreed": "yes"}),
        );
        let input = f.child(0);
        assert!(f.doc.checked(input), "{substrate}");

        // A second model binding on the same element is ignored
        f.controller.bind_model(input, "agreed");
        assert_eq!(f.doc.listener_count(input, "change"), 1, "{substrate}");

        f.doc.set_checked(input, false).unwrap();
        f.doc.dispatch(input, "change");
        assert_eq!(f.store.get("agreed"), Some(json!(false)), "{substrate}");

        f.store.set("agreed", json!(true));
        assert!(f.doc.checked(input));
    }
}

#[test]
fn test_number_and_text_models() {
    for substrate in SubstrateId::ALL {
        let model = attribute(substrate, BindingKind::Model);
        let f = mount(
            substrate,
            &format!(r#"<div><input type="number" {model}="qty"><input {model}="user.name"></div>"#),
            json!({"qty": 2, "user": {"name": "Ada"}}),
        );
        let (number, text) = (f.child(0), f.child(1));
        assert_eq!(f.doc.value(number), "2");
        assert_eq!(f.doc.value(text), "Ada", "{substrate}");

        f.doc.set_value(number, "abc").unwrap();
        f.doc.dispatch(number, "input");
        assert_eq!(f.store.get("qty"), Some(json!(0)), "{substrate}");

        f.doc.set_value(number, "2.5").unwrap();
        f.doc.dispatch(number, "input");
        assert_eq!(f.store.get("qty"), Some(json!(2.5)));

        f.doc.set_value(text, "Grace").unwrap();
        f.doc.dispatch(text, "input");
        assert_eq!(f.store.get("user.name"), Some(json!("Grace")), "{substrate}");
    }
}

#[test]
fn test_event_handlers_run_actions() {
    for substrate in SubstrateId::ALL {
        let text = attribute(substrate, BindingKind::Text);
        let click = event_attribute(substrate, "click");
        let f = mount(
            substrate,
            &format!(
                r#"<div><span {text}="count"></span><button {click}="increment('count')">+</button><a {click}="toggle(open)">t</a></div>"#
            ),
            json!({"count": 0, "open": false}),
        );
        let (span, button, link) = (f.child(0), f.child(1), f.child(2));
        f.doc.dispatch(button, "click");
        f.doc.dispatch(button, "click");
        assert_eq!(f.doc.text_content(span), "2", "{substrate}");

        f.doc.dispatch(link, "click");
        assert_eq!(f.store.get("open"), Some(json!(true)), "{substrate}");
    }
}

#[test]
fn test_event_modifiers() {
    let f = mount(
        SubstrateId::Vanilla,
        r#"<div @click="increment('outer')"><button @click.prevent.stop="increment('inner')">x</button></div>"#,
        json!({"inner": 0, "outer": 0}),
    );
    let button = f.child(0);
    let proceed = f.doc.dispatch_event(&Event::new("click", button));
    assert!(!proceed);
    assert_eq!(f.store.get("inner"), Some(json!(1)));
    assert_eq!(f.store.get("outer"), Some(json!(0)));

    f.doc.dispatch(f.root, "click");
    assert_eq!(f.store.get("outer"), Some(json!(1)));
}

#[test]
fn test_custom_methods_receive_the_store() {
    let f = mount(
        SubstrateId::Vue,
        r#"<div><button @click="double(by)">x</button></div>"#,
        json!({"n": 3, "by": 2}),
    );
    f.controller.core().actions().register(
        "double",
        Rc::new(|ctx: &accelade_runtime::binding::MethodContext<'_>| {
            let n = ctx.store.get("n").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let by = ctx.args[0].to_number();
            ctx.store.set("n", json!(n * by));
        }),
    );
    f.doc.dispatch(f.child(0), "click");
    assert_eq!(f.store.get("n"), Some(json!(6)));
}

#[test]
fn test_no_dom_mutation_after_dispose() {
    for substrate in SubstrateId::ALL {
        let text = attribute(substrate, BindingKind::Text);
        let cond = attribute(substrate, BindingKind::If);
        let click = event_attribute(substrate, "click");
        let f = mount(
            substrate,
            &format!(r#"<div><span {text}="count"></span><p {cond}="count > 0">p</p><button {click}="increment('count')">+</button></div>"#),
            json!({"count": 1}),
        );
        let (span, button) = (f.child(0), f.child(2));
        let before = f.doc.outer_html(f.root);

        f.controller.dispose();
        f.controller.dispose();
        assert!(f.controller.is_disposed());
        assert_eq!(f.controller.core().placeholder_count(), 0);
        assert_eq!(f.doc.listener_count(button, "click"), 0, "{substrate}");

        f.store.set("count", json!(0));
        assert_eq!(f.doc.text_content(span), "1", "{substrate}");
        assert_eq!(f.doc.outer_html(f.root), before, "{substrate}");
    }
}

#[test]
fn test_failed_expressions_leave_siblings_alone() {
    for substrate in SubstrateId::ALL {
        let text = attribute(substrate, BindingKind::Text);
        let f = mount(
            substrate,
            &format!(r#"<div><b {text}="nope("></b><i {text}="missing.deep.path"></i><u {text}="label"></u></div>"#),
            json!({"label": "ok"}),
        );
        assert_eq!(f.doc.text_content(f.child(0)), "");
        assert_eq!(f.doc.text_content(f.child(1)), "");
        assert_eq!(f.doc.text_content(f.child(2)), "ok", "{substrate}");
    }
}

#[test]
fn test_controller_rejects_foreign_store() {
    init_tracing();
    let doc = Document::new();
    let root = doc.append_html(doc.body(), "<div></div>").unwrap()[0];
    let env = HostEnvironment::new(doc);
    let controller = BuiltinAdapter::new(SubstrateId::Vue).create_binding_controller(&env);
    let store = BuiltinAdapter::new(SubstrateId::React).create_state_store();
    assert!(controller.init(root, store).is_err());
}

#[test]
fn test_second_init_is_rejected() {
    let f = mount(SubstrateId::Svelte, "<div></div>", json!({}));
    assert!(matches!(
        f.controller.init(f.root, f.store.clone()),
        Err(accelade_runtime::AcceladeError::AlreadyInitialized)
    ));
}
