//! Fixed builtins layer.
//!
//! Builtins are looked up only after local/enclosing/module/registry
//! resolution fails (see [`crate::eval::Interpreter::eval_name`]), so a
//! sandbox program can never shadow a registered capability by reusing a
//! builtin's name but *can* shadow a builtin with its own binding.

use rayon::prelude::*;

use agentrt_core::{TypeDescriptor, Value};

use crate::control::{EvalError, OutputPayload, Signal};
use crate::error::SandboxError;
use crate::eval::{display_value, host_kind, iterate, Interpreter};
use crate::scope::ScopeChain;

const NAMES: &[&str] = &[
    "print",
    "len",
    "str",
    "int",
    "float",
    "bool",
    "type",
    "is_instance_of",
    "range",
    "task_success",
    "task_fail",
    "task_clarify",
    "task_continue",
    "parallel_map",
];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

pub fn call(interp: &Interpreter, name: &str, args: &[Value], _scope: &mut ScopeChain) -> Result<Value, EvalError> {
    match name {
        "print" => {
            let text = args.iter().map(display_value).collect::<Vec<_>>().join(" ");
            interp.push_output(OutputPayload::Text(text));
            Ok(Value::Null)
        }
        "len" => builtin_len(args),
        "str" => Ok(Value::Str(args.first().map(display_value).unwrap_or_default())),
        "int" => builtin_int(args),
        "float" => builtin_float(args),
        "bool" => Ok(Value::Bool(args.first().map(Value::is_truthy).unwrap_or(false))),
        "type" => Ok(Value::Type(TypeDescriptor {
                    name: type_name_of(args.first().unwrap_or(&Value::Null)),
        })),
        "is_instance_of" => builtin_is_instance_of(args),
        "range" => builtin_range(args),
        "task_success" => builtin_task_success(interp, args),
        "task_fail" => Ok(raise_signal(Signal::Fail(arg_text(args, 0)))?),
        "task_clarify" => Ok(raise_signal(Signal::Clarify(arg_text(args, 0)))?),
        "task_continue" => Ok(raise_signal(Signal::Continue(args.to_vec()))?),
        "parallel_map" => builtin_parallel_map(interp, args),
        other => Err(SandboxError::NameNotFound { name: other.to_string() }.into()),
    }
}

fn arg_text(args: &[Value], i: usize) -> String {
    args.get(i).map(display_value).unwrap_or_default()
}

/// Every terminal-signal builtin unwinds through [`EvalError::Signal`]
/// rather than returning a value; this just gives that unwind a `Result`
/// shape so call sites can use `?` uniformly.
fn raise_signal(signal: Signal) -> Result<Value, EvalError> {
    Err(EvalError::Signal(signal))
}

fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    let v = args.first().ok_or_else(|| SandboxError::Runtime {
            message: "len() requires one argument".to_string(),
    })?;
    let n = match v {
        Value::Array(a) | Value::Tuple(a) | Value::Set(a) => a.len(),
        Value::Map(m) => m.len(),
        Value::Str(s) => s.chars().count(),
        Value::Bytes(b) => b.len(),
        other => {
            return Err(SandboxError::TypeMismatch {
                    expected: "sized container".to_string(),
                    got: other.type_name().to_string(),
                }
                    .into())
        }
    };
    Ok(Value::Int(n as i64))
}

fn builtin_int(args: &[Value]) -> Result<Value, EvalError> {
    let v = args.first().unwrap_or(&Value::Int(0));
    match v {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                SandboxError::TypeMismatch {
                    expected: "int-parseable string".to_string(),
                    got: s.clone(),
                }
                    .into()
        }),
        other => Err(SandboxError::TypeMismatch {
                expected: "number or string".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn builtin_float(args: &[Value]) -> Result<Value, EvalError> {
    let v = args.first().unwrap_or(&Value::Float(0.0));
    match v {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(*b as i64 as f64)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                SandboxError::TypeMismatch {
                    expected: "float-parseable string".to_string(),
                    got: s.clone(),
                }
                    .into()
        }),
        other => Err(SandboxError::TypeMismatch {
                expected: "number or string".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

/// Canonical type-descriptor name for the `type()` builtin. Host classes and records surface their own
/// name rather than the generic `"host"`/`"record"` tag.
fn type_name_of(v: &Value) -> String {
    match v {
        Value::Host(h) if h.kind == host_kind::CLASS || h.kind == host_kind::BUILTIN => h.type_tag.clone(),
        Value::Host(h) => h.type_tag.clone(),
        Value::Record { type_tag: Some(t),.. } => format!("record:{t}"),
        other => other.type_name().to_string(),
    }
}

fn builtin_is_instance_of(args: &[Value]) -> Result<Value, EvalError> {
    let v = args.first().ok_or_else(|| SandboxError::Runtime {
            message: "is_instance_of() requires two arguments".to_string(),
    })?;
    let want = args.get(1).ok_or_else(|| SandboxError::Runtime {
            message: "is_instance_of() requires two arguments".to_string(),
    })?;
    let want_name = match want {
        Value::Type(td) => td.name.clone(),
        Value::Str(s) => s.clone(),
        other => {
            return Err(SandboxError::TypeMismatch {
                    expected: "type descriptor or string".to_string(),
                    got: other.type_name().to_string(),
                }
                    .into())
        }
    };
    Ok(Value::Bool(type_name_of(v) == want_name))
}

fn builtin_range(args: &[Value]) -> Result<Value, EvalError> {
    let ints: Vec<i64> = args
        .iter()
        .map(|v| match v {
            Value::Int(i) => Ok(*i),
            other => Err(SandboxError::TypeMismatch {
                    expected: "int".to_string(),
                    got: other.type_name().to_string(),
            }),
    })
        .collect::<Result<_, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(SandboxError::Runtime {
                    message: "range() takes 1 to 3 arguments".to_string(),
                }
                    .into())
        }
    };
    if step == 0 {
        return Err(SandboxError::ZeroDivision.into());
    }
    let mut out = Vec::new();
    let mut cur = start;
    if step > 0 {
        while cur < stop {
            out.push(Value::Int(cur));
            cur += step;
        }
    } else {
        while cur > stop {
            out.push(Value::Int(cur));
            cur += step;
        }
    }
    Ok(Value::Array(out))
}

/// `task_success` validates its argument against the turn's declared
/// return type; a mismatch becomes an ordinary catchable `TypeMismatch`
/// instead of the terminal signal, so the agent can retry within the same
/// turn budget.
fn builtin_task_success(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let value = args.first().cloned().unwrap_or(Value::Null);
    if let Some(expected) = interp.expected_return_type() {
        let got = type_name_of(&value);
        if !structurally_matches(expected, &value, &got) {
            return Err(SandboxError::TypeMismatch {
                    expected: expected.to_string(),
                    got,
                }
                    .into());
        }
    }
    raise_signal(Signal::Success(value))
}

fn structurally_matches(expected: &str, value: &Value, got: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    match expected.as_str() {
        "any" => true,
        "list" | "array" => matches!(value, Value::Array(_)),
        "dict" | "map" => matches!(value, Value::Map(_)),
        "none" | "null" => matches!(value, Value::Null),
        "tuple" => matches!(value, Value::Tuple(_)),
        "set" => matches!(value, Value::Set(_)),
        _ => expected == got.to_ascii_lowercase(),
    }
}

/// Fan a registered host function across a sequence.
/// Sandbox-defined functions are not eligible targets: their captured
/// closures hold `Rc`/`RefCell` slots that are not `Send`, so only
/// registry-backed host functions (whose `HostFn` is `Arc<dyn... + Send +
/// Sync>`) can cross the `rayon` thread pool.
fn builtin_parallel_map(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let func = args.first().ok_or_else(|| SandboxError::Runtime {
            message: "parallel_map() requires a function and an iterable".to_string(),
    })?;
    let items_arg = args.get(1).ok_or_else(|| SandboxError::Runtime {
            message: "parallel_map() requires a function and an iterable".to_string(),
    })?;
    let host = match func {
        Value::Host(h) if h.kind == host_kind::FUNCTION => h,
        Value::Function(_) => {
            return Err(SandboxError::ForbiddenCall {
                    target: "parallel_map() only accepts registered host functions".to_string(),
                }
                    .into())
        }
        other => {
            return Err(SandboxError::TypeMismatch {
                    expected: "registered host function".to_string(),
                    got: other.type_name().to_string(),
                }
                    .into())
        }
    };
    let entry = interp
        .registry()
        .function(&host.registered_name)
        .ok_or_else(|| SandboxError::NameNotFound {
            name: host.registered_name.clone(),
    })?;
    let items = iterate(items_arg)?;
    let results: Result<Vec<Value>, agentrt_registry::RegistryError> =
    items.par_iter().map(|item| entry.call(std::slice::from_ref(item))).collect();
    Ok(Value::Array(results.map_err(SandboxError::from)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_core::Namespace;
    use agentrt_registry::Registry;
    use agentrt_store::StateHandle;
    use std::time::Duration;

    fn interp(registry: &Registry) -> Interpreter<'_> {
        Interpreter::new(registry, StateHandle::None, Namespace::root(), Duration::from_secs(1), None)
    }

    #[test]
    fn len_counts_array_elements() {
        let registry = Registry::new();
        let i = interp(&registry);
        let mut scope_frame = crate::scope::Frame::new();
        let module = crate::scope::Frame::new();
        let mut scope = ScopeChain {
            local: &mut scope_frame,
            enclosing: None,
            module: &module,
        };
        let v = call(&i, "len", &[Value::Array(vec![Value::Int(1), Value::Int(2)])], &mut scope).unwrap();
        assert_eq!(v, Value::Int(2));
    }

    #[test]
    fn range_with_stop_only() {
        let registry = Registry::new();
        let i = interp(&registry);
        let mut scope_frame = crate::scope::Frame::new();
        let module = crate::scope::Frame::new();
        let mut scope = ScopeChain {
            local: &mut scope_frame,
            enclosing: None,
            module: &module,
        };
        let v = call(&i, "range", &[Value::Int(3)], &mut scope).unwrap();
        assert_eq!(v, Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn task_success_raises_signal() {
        let registry = Registry::new();
        let i = interp(&registry);
        let mut scope_frame = crate::scope::Frame::new();
        let module = crate::scope::Frame::new();
        let mut scope = ScopeChain {
            local: &mut scope_frame,
            enclosing: None,
            module: &module,
        };
        let err = call(&i, "task_success", &[Value::Int(42)], &mut scope).unwrap_err();
        assert!(matches!(err, EvalError::Signal(Signal::Success(Value::Int(42)))));
    }

    #[test]
    fn task_success_rejects_mismatched_declared_type() {
        let registry = Registry::new();
        let i = Interpreter::new(
            &registry,
            StateHandle::None,
            Namespace::root(),
            Duration::from_secs(1),
            Some("int".to_string()),
        );
        let mut scope_frame = crate::scope::Frame::new();
        let module = crate::scope::Frame::new();
        let mut scope = ScopeChain {
            local: &mut scope_frame,
            enclosing: None,
            module: &module,
        };
        let err = call(&i, "task_success", &[Value::Str("oops".to_string())], &mut scope).unwrap_err();
        assert!(matches!(err, EvalError::Sandbox(SandboxError::TypeMismatch {.. })));
    }
}
