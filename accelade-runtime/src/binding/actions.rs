//! Event handler dispatch
//!
//! A handler attribute holds `name` or `name(arg, ...)`. Custom methods
//! registered on the component win over the built-in actions:
//!
//! | action | effect |
//! |---|---|
//! | `toggle(key)` | flips the truthiness of `key` |
//! | `increment(key[, by])` | adds `by` (default 1) |
//! | `decrement(key[, by])` | subtracts `by` (default 1) |
//! | `set(key, value)` | writes `value` |
//! | `reset([key])` | restores the initial value of `key`, or of everything |
//!
//! The key of a built-in action may be written as a string literal or as a
//! bare path (`toggle(open)` and `toggle('open')` are the same). Every
//! other argument is evaluated against the current state, with the event
//! available as `$event`.

use crate::expr::{interp, Evaluator, Expr, Locals, Scope, Value};
use crate::path::{self, State};
use crate::store::StateStore;
use accelade_dom::Event;
use serde_json::{json, Value as Json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// What a custom method sees when invoked
pub struct MethodContext<'a> {
    pub store: &'a dyn StateStore,
    pub args: &'a [Value],
    pub event: Option<&'a Event>,
}

pub type CustomMethod = dyn Fn(&MethodContext<'_>);

/// The actions available to a component's event handlers
pub struct Actions {
    evaluator: Rc<Evaluator>,
    methods: RefCell<HashMap<String, Rc<CustomMethod>>>,
    initial: RefCell<State>,
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.methods.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Actions").field("methods", &names).finish()
    }
}

/// JSON view of an event, bound to `$event`
pub fn event_json(event: &Event) -> Json {
    json!({
        "type": event.kind,
        "detail": event.detail.clone().unwrap_or(Json::Null),
    })
}

impl Actions {
    pub fn new(evaluator: Rc<Evaluator>) -> Self {
        Self {
            evaluator,
            methods: RefCell::new(HashMap::new()),
            initial: RefCell::new(State::new()),
        }
    }

    pub fn register(&self, name: impl Into<String>, method: Rc<CustomMethod>) {
        self.methods.borrow_mut().insert(name.into(), method);
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.borrow().contains_key(name)
    }

    /// State that `reset` restores
    pub fn set_initial(&self, state: State) {
        *self.initial.borrow_mut() = state;
    }

    /// Run `handler`; returns whether it resolved to an action
    pub fn invoke(&self, handler: &str, store: &dyn StateStore, event: Option<&Event>) -> bool {
        let expr = match self.evaluator.parse(handler.trim()) {
            Ok(expr) => expr,
            Err(err) => {
                warn!(handler, "Failed to parse event handler: {err}");
                return false;
            }
        };
        let (name, args): (&str, &[Expr]) = match expr.as_ref() {
            Expr::Ident(name) => (name.as_str(), &[][..]),
            Expr::Call { callee, args } => match callee.as_ref() {
                Expr::Ident(name) => (name.as_str(), args.as_slice()),
                _ => {
                    warn!(handler, "Event handler must name an action");
                    return false;
                }
            },
            _ => {
                warn!(handler, "Event handler must name an action");
                return false;
            }
        };

        let state = store.get_state();
        let event_value = event.map(event_json).unwrap_or(Json::Null);
        let scope = Locals::new(&state).with("$event", event_value);

        let method = self.methods.borrow().get(name).cloned();
        if let Some(method) = method {
            let values: Vec<Value> = args.iter().map(|arg| self.eval(arg, &scope)).collect();
            debug!(method = %name, "invoking custom method");
            method(&MethodContext {
                store,
                args: &values,
                event,
            });
            return true;
        }

        match name {
            "toggle" | "increment" | "decrement" | "set" | "reset" => {}
            _ => {
                warn!(handler, "Unknown action: {name}");
                return false;
            }
        }

        let Some(key) = args.first().and_then(action_key) else {
            if name == "reset" {
                let initial = self.initial.borrow().clone();
                store.set_many(initial);
                return true;
            }
            warn!(handler, "Action {name} needs a state key");
            return false;
        };
        let rest: Vec<Value> = args[1..].iter().map(|arg| self.eval(arg, &scope)).collect();
        let current = Value::from_optional_json(store.get(&key).as_ref());

        match name {
            "toggle" => {
                store.set(&key, Json::Bool(!current.truthy()));
            }
            "increment" | "decrement" => {
                let by = rest.first().map(Value::to_number).unwrap_or(1.0);
                let by = if name == "decrement" { -by } else { by };
                let base = match current.to_number() {
                    n if n.is_nan() => 0.0,
                    n => n,
                };
                store.set(&key, number_json(base + by));
            }
            "set" => {
                let value = rest.first().and_then(Value::to_json).unwrap_or(Json::Null);
                store.set(&key, value);
            }
            _ => {
                let initial = path::get_path(&self.initial.borrow(), &key)
                    .cloned()
                    .unwrap_or(Json::Null);
                store.set(&key, initial);
            }
        }
        true
    }

    fn eval(&self, expr: &Expr, scope: &dyn Scope) -> Value {
        match interp::eval(expr, scope) {
            Ok(value) => value,
            Err(err) => {
                warn!("Handler argument failed to evaluate: {err}");
                Value::Undefined
            }
        }
    }
}

/// The state key named by a built-in action's first argument
fn action_key(arg: &Expr) -> Option<String> {
    match arg {
        Expr::Literal(Value::String(key)) => Some(key.clone()),
        other => other.as_path(),
    }
}

fn number_json(n: f64) -> Json {
    Value::Number(n).to_json().unwrap_or(Json::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{create_store, StateStore};
    use accelade_types::SubstrateId;
    use std::cell::Cell;

    fn setup(initial: Json) -> (Actions, Rc<dyn StateStore>) {
        let Json::Object(initial) = initial else {
            panic!("expected an object");
        };
        let store = create_store(SubstrateId::Vanilla);
        store.init(initial.clone());
        let actions = Actions::new(Rc::new(Evaluator::default()));
        actions.set_initial(initial);
        (actions, store)
    }

    #[test]
    fn test_builtin_actions() {
        let (actions, store) = setup(json!({"open": false, "count": 1, "name": "a"}));

        assert!(actions.invoke("toggle('open')", store.as_ref(), None));
        assert_eq!(store.get("open"), Some(json!(true)));
        actions.invoke("toggle(open)", store.as_ref(), None);
        assert_eq!(store.get("open"), Some(json!(false)));

        actions.invoke("increment('count')", store.as_ref(), None);
        actions.invoke("increment(count, 5)", store.as_ref(), None);
        actions.invoke("decrement('count', 2)", store.as_ref(), None);
        assert_eq!(store.get("count"), Some(json!(5)));

        actions.invoke("set('name', name + 'b')", store.as_ref(), None);
        assert_eq!(store.get("name"), Some(json!("ab")));

        actions.invoke("reset('count')", store.as_ref(), None);
        assert_eq!(store.get("count"), Some(json!(1)));

        actions.invoke("reset", store.as_ref(), None);
        assert_eq!(store.get("name"), Some(json!("a")));
    }

    #[test]
    fn test_increment_missing_key_starts_at_zero() {
        let (actions, store) = setup(json!({}));
        actions.invoke("increment('clicks')", store.as_ref(), None);
        assert_eq!(store.get("clicks"), Some(json!(1)));
    }

    #[test]
    fn test_custom_methods_take_precedence() {
        let (actions, store) = setup(json!({"count": 0}));
        let calls = Rc::new(Cell::new(0.0));
        let c = calls.clone();
        actions.register(
            "increment",
            Rc::new(move |ctx: &MethodContext<'_>| {
                c.set(ctx.args.first().map(Value::to_number).unwrap_or(-1.0));
            }),
        );
        actions.invoke("increment(count + 10)", store.as_ref(), None);
        assert_eq!(calls.get(), 10.0);
        assert_eq!(store.get("count"), Some(json!(0)));
    }

    #[test]
    fn test_event_is_available_to_arguments() {
        let (actions, store) = setup(json!({}));
        let event = Event::new("custom", accelade_dom::NodeId(1)).with_detail(json!({"id": 7}));
        actions.invoke("set('picked', $event.detail.id)", store.as_ref(), Some(&event));
        assert_eq!(store.get("picked"), Some(json!(7)));
    }

    #[test]
    fn test_unknown_or_malformed_handlers_do_nothing() {
        let (actions, store) = setup(json!({"n": 1}));
        assert!(!actions.invoke("explode()", store.as_ref(), None));
        assert!(!actions.invoke("increment(", store.as_ref(), None));
        assert!(!actions.invoke("a.b()", store.as_ref(), None));
        assert_eq!(store.get_state().len(), 1);
    }
}
