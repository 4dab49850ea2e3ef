//! Tree-walking evaluator.
//!
//! One [`Interpreter`] executes a single code fragment (one agent turn)
//! against a namespace's state view. Name resolution walks local ->
//! enclosing (closure-captured) -> module (state-backed) -> registry
//! capabilities -> fixed builtins, exactly the ordernames.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use agentrt_core::{CommitHash, HostHandle, Namespace, Value};
use agentrt_registry::{Capability, Registry};
use agentrt_store::StateHandle;
use indexmap::IndexMap;

use crate::ast::*;
use crate::builtins;
use crate::control::{EvalError, Flow, OutputPayload, Signal};
use crate::error::{ExceptionKind, SandboxError};
use crate::scope::{Frame, ScopeChain};

/// Host-value `kind` tags the evaluator itself assigns to name-resolution
/// placeholders that stand for a registry capability;
/// distinct from the `kind`s a registrar assigns to real instances.
pub(crate) mod host_kind {
    pub const FUNCTION: &str = "__fn__";
    pub const CLASS: &str = "__class__";
    pub const MODULE: &str = "__module__";
    pub const BUILTIN: &str = "__builtin__";
}

const CONTAINER_METHODS: &[&str] = &[
    "append", "pop", "extend", "index", "get", "keys", "values", "items", "add", "remove", "upper",
    "lower", "strip", "split", "join", "clear", "count",
];

/// What one `Interpreter::run` produced.
pub struct RunOutcome {
    /// The task-terminal signal raised, if any. `None` means the fragment ran to completion with no
    /// `task_*` call; the agent loop treats that as "no signal this turn".
    pub signal: Option<Signal>,
    /// `print`/image-view payloads emitted during this turn, in order.
    pub outputs: Vec<OutputPayload>,
    /// The commit hash this turn produced, if running in Versioned mode and
    /// at least one module-level binding changed.
    pub commit_hash: Option<CommitHash>,
}

pub struct Interpreter<'a> {
    registry: &'a Registry,
    state: StateHandle,
    namespace: Namespace,
    deadline: Instant,
    expected_return_type: Option<String>,
    module: RefCell<Frame>,
    loaded_snapshot: RefCell<HashMap<String, Value>>,
    outputs: RefCell<Vec<OutputPayload>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        registry: &'a Registry,
        state: StateHandle,
        namespace: Namespace,
        timeout: Duration,
        expected_return_type: Option<String>,
    ) -> Self {
        Self {
            registry,
            state,
            namespace,
            deadline: Instant::now() + timeout,
            expected_return_type,
            module: RefCell::new(Frame::new()),
            loaded_snapshot: RefCell::new(HashMap::new()),
            outputs: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn push_output(&self, payload: OutputPayload) {
        self.outputs.borrow_mut().push(payload);
    }

    pub fn expected_return_type(&self) -> Option<&str> {
        self.expected_return_type.as_deref()
    }

    fn check_deadline(&self) -> Result<(), SandboxError> {
        if Instant::now() >= self.deadline {
            return Err(SandboxError::ExecutionTimeout {
                    elapsed_ms: self.deadline.elapsed().as_millis(),
            });
        }
        Ok(())
    }

    /// Lazily fetch a module-level (state-backed) name, recording its
    /// loaded baseline for later mutation detection.
    fn load_module_name(&self, name: &str) -> Result<Option<Value>, SandboxError> {
        if let Some(v) = self.module.borrow().get(name) {
            return Ok(Some(v.borrow().clone()));
        }
        match self.state.get(&self.namespace, name)? {
            Some(v) => {
                self.loaded_snapshot.borrow_mut().insert(name.to_string(), v.clone());
                self.module.borrow_mut().declare(name, v.clone());
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

    /// Fetch the live slot for an already-materialized module-level name,
    /// for in-place container mutation (`xs.append(3)`) to be visible to
    /// every alias and to `flush_dirty_state`. A short-lived borrow only:
    /// the returned `Rc` clone outlives it.
    fn module_slot(&self, name: &str) -> Option<crate::scope::Slot> {
        self.module.borrow().get(name)
    }

    /// Bind a bare name. At top level (`scope.enclosing.is_none()`) every
    /// name is module scope, so the binding goes straight into
    /// `self.module`, state-backed and visible to later turns; inside a
    /// function call it stays in the call's own local frame, matching the
    /// restricted language's lack of `global`/`nonlocal`.
    fn assign_name(&self, scope: &mut ScopeChain, name: &str, value: Value) {
        if scope.enclosing.is_none() {
            self.module.borrow_mut().set_existing_or_declare(name, value);
        } else {
            scope.assign(name, value);
        }
    }

    /// Snapshot every free name a function body defined right now could
    /// reference out of the scope chain in effect at definition time: the
    /// call's own locals, its enclosing closure capture, and (since a
    /// top-level `def` closes over module state directly) whatever is
    /// already materialized in `self.module`. Local/enclosing take priority
    /// over module so a name shadowed at an inner scope captures the inner
    /// value, matching `ScopeChain::resolve`'s own lookup order.
    fn capture_enclosing(&self, scope: &ScopeChain) -> IndexMap<String, Value> {
        let mut captured = scope.local.snapshot();
        if let Some(enclosing) = scope.enclosing {
            for (k, v) in enclosing {
                captured.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        for (name, value) in self.module.borrow().snapshot() {
            captured.entry(name).or_insert(value);
        }
        captured
    }

    /// Execute a top-level code fragment (one turn). `local` here only ever
    /// holds `with`-scoped ephemeral bindings (removed before the block
    /// exits); every real binding a top-level statement makes goes through
    /// [`Self::assign_name`] straight into `self.module`, so no borrow of
    /// `self.module` is ever held across the call into `exec_block` below.
    pub fn run(&self, block: &Block) -> Result<RunOutcome, SandboxError> {
        let mut local = Frame::new();
        let dummy_module = Frame::new();
        let mut scope = ScopeChain {
            local: &mut local,
            enclosing: None,
            module: &dummy_module,
        };
        let result = self.exec_block(block, &mut scope);
        let signal = match result {
            Ok(_) => None,
            Err(EvalError::Signal(sig)) => Some(sig),
            Err(EvalError::Sandbox(e)) => return Err(e),
        };
        let commit_hash = self.flush_dirty_state()?;
        Ok(RunOutcome {
                signal,
                outputs: self.outputs.borrow().clone(),
                commit_hash,
        })
    }

    /// Diff every module-level binding against its loaded baseline and
    /// write through the ones that are new or changed, in one atomic
    /// commit.
    fn flush_dirty_state(&self) -> Result<Option<CommitHash>, SandboxError> {
        let module = self.module.borrow();
        let baseline = self.loaded_snapshot.borrow();
        let mut writes = std::collections::BTreeMap::new();
        for name in module.names() {
            let current = module.get(name).unwrap().borrow().clone();
            let changed = match baseline.get(name) {
                Some(prior) => *prior != current,
                None => true,
            };
            if changed {
                writes.insert(name.clone(), Some(current));
            }
        }
        drop(module);
        drop(baseline);
        if writes.is_empty() {
            return Ok(self.state.commit_hash());
        }
        if let StateHandle::Versioned(session) = &self.state {
            let hash = session.put_many(&self.namespace, writes)?;
            return Ok(Some(hash));
        }
        for (k, v) in writes {
            if let Some(v) = v {
                self.state.put(&self.namespace, &k, v)?;
            }
        }
        Ok(self.state.commit_hash())
    }

    // ---- statements ----

    fn exec_block(&self, block: &Block, scope: &mut ScopeChain) -> Result<Flow, EvalError> {
        for stmt in block {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: &mut ScopeChain) -> Result<Flow, EvalError> {
        self.check_deadline()?;
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Pass => Ok(Flow::Normal),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(e) => {
                let v = match e {
                    Some(e) => Some(self.eval_expr(e, scope)?),
                    None => None,
                };
                Ok(Flow::Return(v))
            }
            Stmt::Assign { targets, value } => {
                let v = self.eval_expr(value, scope)?;
                for t in targets {
                    self.assign_target(t, v.clone(), scope)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::AugAssign { target, op, value } => {
                let current = self.eval_target_value(target, scope)?;
                let rhs = self.eval_expr(value, scope)?;
                let result = eval_binop(*op, &current, &rhs)?;
                self.assign_target(target, result, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval_expr(cond, scope)?.is_truthy() {
                        return self.exec_block(body, scope);
                    }
                }
                if let Some(body) = orelse {
                    return self.exec_block(body, scope);
                }
                Ok(Flow::Normal)
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, scope)?.is_truthy() {
                    self.check_deadline()?;
                    match self.exec_block(body, scope)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => continue,
                        other @ Flow::Return(_) => return Ok(other),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For { target, iter, body } => {
                let iterable = self.eval_expr(iter, scope)?;
                let items = iterate(&iterable)?;
                for item in items {
                    self.bind_target(target, item, scope)?;
                    self.check_deadline()?;
                    match self.exec_block(body, scope)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => continue,
                        other @ Flow::Return(_) => return Ok(other),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FuncDef { name, params, body } => {
                let bytes = bincode::serialize(body).map_err(|e| SandboxError::Runtime {
                        message: format!("failed to encode function body: {e}"),
                })?;
                let captured = self.capture_enclosing(scope);
                let func = Value::Function(agentrt_core::SandboxFunction {
                        params: params.clone(),
                        body: bytes,
                        captured,
                        name: Some(name.clone()),
                });
                self.assign_name(scope, name, func);
                Ok(Flow::Normal)
            }
            Stmt::RecordDef {.. } => {
                // Named-record definitions are purely declarative here:
                // record *literals* (`Point { x: 1, y: 2 }`) carry their
                // own type_tag and fields at construction, so there is no
                // runtime table to populate.
                Ok(Flow::Normal)
            }
            Stmt::Import { name, alias } => {
                if !self.registry.contains(name) {
                    return Err(SandboxError::ForbiddenImport { name: name.clone() }.into());
                }
                let v = self.resolve_capability_value(name)?;
                self.assign_name(scope, alias.as_deref().unwrap_or(name), v);
                Ok(Flow::Normal)
            }
            Stmt::With { items, body } => {
                let mut bound = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.eval_expr(&item.context, scope)?;
                    if let Some(name) = &item.binding {
                        scope.assign(name, value);
                        bound.push(name.clone());
                    }
                }
                let result = self.exec_block(body, scope);
                // With-item bindings live only in `scope.local`, never in
                // `self.module` (see `assign_name`), so they never reach
                // `flush_dirty_state`'s mutation diff regardless of win or
                // lose; any *other* name the body assigns still flows
                // through normally via `assign_name`.
                for name in &bound {
                    scope.local.remove(name);
                }
                result
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finally,
            } => {
                let result = self.exec_block(body, scope);
                let outcome = match result {
                    Ok(flow) => {
                        if let Some(orelse) = orelse {
                            self.exec_block(orelse, scope)
                        } else {
                            Ok(flow)
                        }
                    }
                    Err(EvalError::Sandbox(e)) => {
                        if let Some(kind) = e.exception_kind() {
                            if let Some(handler) = handlers.iter().find(|h| {
                                    h.kind.as_deref().and_then(ExceptionKind::from_name) == Some(kind)
                            }) {
                                if let Some(bind) = &handler.bind {
                                    self.assign_name(scope, bind, Value::Str(e.to_string()));
                                }
                                self.exec_block(&handler.body, scope)
                            } else {
                                Err(EvalError::Sandbox(e))
                            }
                        } else {
                            Err(EvalError::Sandbox(e))
                        }
                    }
                    signal @ Err(EvalError::Signal(_)) => signal,
                };
                if let Some(finally) = finally {
                    let finally_result = self.exec_block(finally, scope)?;
                    if !matches!(finally_result, Flow::Normal) {
                        return Ok(finally_result);
                    }
                }
                outcome
            }
        }
    }

    fn assign_target(&self, target: &Target, value: Value, scope: &mut ScopeChain) -> Result<(), EvalError> {
        match target {
            Target::Name(n) => {
                self.assign_name(scope, n, value);
                Ok(())
            }
            Target::Tuple(items) => {
                let parts = match value {
                    Value::Tuple(v) | Value::Array(v) => v,
                    other => {
                        return Err(SandboxError::TypeMismatch {
                                expected: "tuple".to_string(),
                                got: other.type_name().to_string(),
                            }
                                .into())
                    }
                };
                if parts.len() != items.len() {
                    return Err(SandboxError::Runtime {
                            message: format!("cannot unpack {} values into {} targets", parts.len(), items.len()),
                        }
                            .into());
                }
                for (t, v) in items.iter().zip(parts) {
                    self.assign_target(t, v, scope)?;
                }
                Ok(())
            }
            Target::Index { obj, index } => {
                let idx = self.eval_expr(index, scope)?;
                self.mutate_lvalue(obj, scope, |container| set_index(container, &idx, value))
            }
            Target::Attribute { obj, attr } => {
                let owner = self.eval_expr(obj, scope)?;
                match owner {
                    Value::Record {.. } => {
                        self.mutate_lvalue(obj, scope, |container| {
                                if let Value::Record { fields,.. } = container {
                                    fields.insert(attr.clone(), value.clone());
                                    Ok(())
                                } else {
                                    Err(SandboxError::TypeMismatch {
                                            expected: "record".to_string(),
                                            got: container.type_name().to_string(),
                                        }
                                            .into())
                                }
                        })
                    }
                    other => Err(SandboxError::ForbiddenAttributeAccess {
                            type_name: other.type_name().to_string(),
                            attr: attr.clone(),
                        }
                            .into()),
                }
            }
        }
    }

    fn bind_target(&self, target: &Target, value: Value, scope: &mut ScopeChain) -> Result<(), EvalError> {
        self.assign_target(target, value, scope)
    }

    fn eval_target_value(&self, target: &Target, scope: &mut ScopeChain) -> Result<Value, EvalError> {
        match target {
            Target::Name(n) => scope
                .resolve(n)
                .ok_or_else(|| SandboxError::NameNotFound { name: n.clone() }.into()),
            Target::Index { obj, index } => {
                let container = self.eval_expr(obj, scope)?;
                let idx = self.eval_expr(index, scope)?;
                get_index(&container, &idx)
            }
            Target::Attribute { obj, attr } => {
                let owner = self.eval_expr(obj, scope)?;
                self.resolve_attribute(&owner, attr, &[])
            }
            Target::Tuple(_) => Err(SandboxError::Runtime {
                    message: "tuple targets are not valid augmented-assignment targets".to_string(),
                }
                    .into()),
        }
    }

    /// Mutate a container reached through `obj`, writing back through the
    /// name's slot when `obj` is a bare name so aliases observe the change
    ///.
    fn mutate_lvalue(
        &self,
        obj: &Expr,
        scope: &mut ScopeChain,
        f: impl FnOnce(&mut Value) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        if let Expr::Name(name) = obj {
            if let Some(slot) = scope.resolve_slot(name).or_else(|| self.module_slot(name)) {
                let mut v = slot.borrow_mut();
                return f(&mut v);
            }
        }
        let mut v = self.eval_expr(obj, scope)?;
        f(&mut v)?;
        self.assign_target(&expr_as_target(obj)?, v, scope)
    }

    // ---- expressions ----

    pub fn eval_expr(&self, expr: &Expr, scope: &mut ScopeChain) -> Result<Value, EvalError> {
        self.check_deadline()?;
        match expr {
            Expr::Literal(lit) => Ok(literal_to_value(lit)),
            Expr::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Literal(s) => out.push_str(s),
                        FStringPart::Expr(e) => out.push_str(&display_value(&self.eval_expr(e, scope)?)),
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::Name(name) => self.eval_name(name, scope),
            Expr::List(items) => Ok(Value::Array(
                    items.iter().map(|e| self.eval_expr(e, scope)).collect::<Result<_, _>>()?,
            )),
            Expr::TupleLit(items) => Ok(Value::Tuple(
                    items.iter().map(|e| self.eval_expr(e, scope)).collect::<Result<_, _>>()?,
            )),
            Expr::SetLit(items) => {
                let mut out: Vec<Value> = Vec::new();
                for e in items {
                    let v = self.eval_expr(e, scope)?;
                    if !out.contains(&v) {
                        out.push(v);
                    }
                }
                Ok(Value::Set(out))
            }
            Expr::MapLit(entries) => {
                let mut m = IndexMap::new();
                for (k, v) in entries {
                    let key = self.eval_expr(k, scope)?;
                    let key = value_to_map_key(&key)?;
                    let val = self.eval_expr(v, scope)?;
                    m.insert(key, val);
                }
                Ok(Value::Map(m))
            }
            Expr::RecordLit { type_tag, fields } => {
                let mut f = IndexMap::new();
                for (name, e) in fields {
                    f.insert(name.clone(), self.eval_expr(e, scope)?);
                }
                Ok(Value::Record {
                        type_tag: type_tag.clone(),
                        fields: f,
                })
            }
            Expr::Unary(op, inner) => {
                let v = self.eval_expr(inner, scope)?;
                eval_unop(*op, &v)
            }
            Expr::Binary(op, l, r) => {
                let lv = self.eval_expr(l, scope)?;
                let rv = self.eval_expr(r, scope)?;
                eval_binop(*op, &lv, &rv)
            }
            Expr::BoolOp(op, exprs) => {
                let mut acc = self.eval_expr(&exprs[0], scope)?;
                for e in &exprs[1..] {
                    let short_circuit = match op {
                        BoolOp::And => !acc.is_truthy(),
                        BoolOp::Or => acc.is_truthy(),
                    };
                    if short_circuit {
                        return Ok(acc);
                    }
                    acc = self.eval_expr(e, scope)?;
                }
                Ok(acc)
            }
            Expr::Compare(first, chain) => {
                let mut left = self.eval_expr(first, scope)?;
                for (op, rhs_expr) in chain {
                    let right = self.eval_expr(rhs_expr, scope)?;
                    if !eval_cmp(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Ternary { cond, body, orelse } => {
                if self.eval_expr(cond, scope)?.is_truthy() {
                    self.eval_expr(body, scope)
                } else {
                    self.eval_expr(orelse, scope)
                }
            }
            Expr::Index { obj, index } => {
                let container = self.eval_expr(obj, scope)?;
                let idx = self.eval_expr(index, scope)?;
                get_index(&container, &idx)
            }
            Expr::Attribute { obj, attr } => {
                let owner = self.eval_expr(obj, scope)?;
                self.resolve_attribute(&owner, attr, &[])
            }
            Expr::Call { func, args } => self.eval_call(func, args, scope),
        }
    }

    fn eval_name(&self, name: &str, scope: &mut ScopeChain) -> Result<Value, EvalError> {
        if let Some(v) = scope.resolve(name) {
            return Ok(v);
        }
        if let Some(v) = self.load_module_name(name)? {
            return Ok(v);
        }
        if self.registry.contains(name) {
            return self.resolve_capability_value(name);
        }
        if builtins::is_builtin(name) {
            return Ok(Value::Host(HostHandle {
                        kind: host_kind::BUILTIN.to_string(),
                        registered_name: name.to_string(),
                        type_tag: "builtin".to_string(),
                        live: None,
            }));
        }
        Err(SandboxError::NameNotFound { name: name.to_string() }.into())
    }

    fn resolve_capability_value(&self, name: &str) -> Result<Value, EvalError> {
        match self.registry.resolve(name) {
            Some(Capability::Function(_)) => Ok(Value::Host(HostHandle {
                        kind: host_kind::FUNCTION.to_string(),
                        registered_name: name.to_string(),
                        type_tag: "function".to_string(),
                        live: None,
            })),
            Some(Capability::Class(c)) => Ok(Value::Host(HostHandle {
                        kind: host_kind::CLASS.to_string(),
                        registered_name: name.to_string(),
                        type_tag: c.type_descriptor.name.clone(),
                        live: None,
            })),
            Some(Capability::Module(_)) => Ok(Value::Host(HostHandle {
                        kind: host_kind::MODULE.to_string(),
                        registered_name: name.to_string(),
                        type_tag: "module".to_string(),
                        live: None,
            })),
            Some(Capability::Instance(i)) => Ok(i.as_value()),
            None => Err(SandboxError::NameNotFound { name: name.to_string() }.into()),
        }
    }

    fn eval_call(&self, func: &Expr, args: &[Expr], scope: &mut ScopeChain) -> Result<Value, EvalError> {
        if let Expr::Attribute { obj, attr } = func {
            let owner = self.eval_expr(obj, scope)?;
            if matches!(owner, Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Str(_))
            && CONTAINER_METHODS.contains(&attr.as_str())
            {
                let arg_values = self.eval_args(args, scope)?;
                if let Expr::Name(name) = &**obj {
                    if let Some(slot) = scope.resolve_slot(name).or_else(|| self.module_slot(name)) {
                        let mut v = slot.borrow_mut();
                        return call_container_method(&mut v, attr, arg_values);
                    }
                }
                let mut owner = owner;
                return call_container_method(&mut owner, attr, arg_values);
            }
            let arg_values = self.eval_args(args, scope)?;
            return self.resolve_attribute(&owner, attr, &arg_values);
        }
        if let Expr::Name(name) = func {
            if scope.resolve(name).is_none() && self.load_module_name(name)?.is_none() {
                if let Some(entry) = self.registry.function(name) {
                    let arg_values = self.eval_args(args, scope)?;
                    return entry.call(&arg_values).map_err(SandboxError::from).map_err(Into::into);
                }
                if let Some(class) = self.registry.class(name) {
                    if !class.constructable {
                        return Err(SandboxError::ForbiddenCall { target: name.clone() }.into());
                    }
                    let arg_values = self.eval_args(args, scope)?;
                    return class.construct(&arg_values).map_err(SandboxError::from).map_err(Into::into);
                }
                if builtins::is_builtin(name) {
                    let arg_values = self.eval_args(args, scope)?;
                    return builtins::call(self, name, &arg_values, scope);
                }
            }
        }
        let callee = self.eval_expr(func, scope)?;
        let arg_values = self.eval_args(args, scope)?;
        self.call_value(&callee, &arg_values, scope)
    }

    fn eval_args(&self, args: &[Expr], scope: &mut ScopeChain) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|a| self.eval_expr(a, scope)).collect()
    }

    fn call_value(&self, callee: &Value, args: &[Value], scope: &mut ScopeChain) -> Result<Value, EvalError> {
        match callee {
            Value::Function(f) => self.call_sandbox_function(f, args),
            Value::Host(h) if h.kind == host_kind::FUNCTION => self
                .registry
                .function(&h.registered_name)
                .ok_or_else(|| SandboxError::NameNotFound {
                    name: h.registered_name.clone(),
            })?
                .call(args)
                .map_err(SandboxError::from)
                .map_err(Into::into),
            Value::Host(h) if h.kind == host_kind::CLASS => {
                let class = self
                    .registry
                    .class(&h.registered_name)
                    .ok_or_else(|| SandboxError::NameNotFound {
                        name: h.registered_name.clone(),
                })?;
                if !class.constructable {
                    return Err(SandboxError::ForbiddenCall {
                            target: h.registered_name.clone(),
                        }
                            .into());
                }
                class.construct(args).map_err(SandboxError::from).map_err(Into::into)
            }
            Value::Host(h) if h.kind == host_kind::BUILTIN => builtins::call(self, &h.registered_name, args, scope),
            _ => Err(SandboxError::ForbiddenCall {
                    target: "<non-callable value>".to_string(),
                }
                    .into()),
        }
    }

    fn call_sandbox_function(&self, f: &agentrt_core::SandboxFunction, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() != f.params.len() {
            return Err(SandboxError::Runtime {
                    message: format!("expected {} arguments, got {}", f.params.len(), args.len()),
                }
                    .into());
        }
        let body: Block = bincode::deserialize(&f.body).map_err(|e| SandboxError::Runtime {
                message: format!("failed to decode function body: {e}"),
        })?;
        let mut local = Frame::new();
        for (name, value) in f.params.iter().zip(args.iter().cloned()) {
            local.declare(name, value);
        }
        let module = Frame::new();
        let mut inner_scope = ScopeChain {
            local: &mut local,
            enclosing: Some(&f.captured),
            module: &module,
        };
        match self.exec_block(&body, &mut inner_scope)? {
            Flow::Return(Some(v)) => Ok(v),
            _ => Ok(Value::Null),
        }
    }

    /// Attribute/bound-method resolution against a registered capability or
    /// a sandbox record.
    fn resolve_attribute(&self, owner: &Value, attr: &str, args: &[Value]) -> Result<Value, EvalError> {
        match owner {
            Value::Record { fields,.. } => {
                if !args.is_empty() {
                    return Err(SandboxError::ForbiddenCall {
                            target: format!("record field '{attr}' is not callable"),
                        }
                            .into());
                }
                fields
                    .get(attr)
                    .cloned()
                    .ok_or_else(|| SandboxError::KeyNotFound { key: attr.to_string() }.into())
            }
            Value::Host(h) if h.kind == host_kind::MODULE => {
                let module = self
                    .registry
                    .module(&h.registered_name)
                    .ok_or_else(|| SandboxError::NameNotFound {
                        name: h.registered_name.clone(),
                })?;
                if !module.is_member_available(attr) {
                    return Err(SandboxError::ForbiddenAttributeAccess {
                            type_name: h.registered_name.clone(),
                            attr: attr.to_string(),
                        }
                            .into());
                }
                module.call_member(attr, args).map_err(SandboxError::from).map_err(Into::into)
            }
            Value::Host(h) if self.registry.instance(&h.registered_name).is_some() => {
                let instance = self.registry.instance(&h.registered_name).expect("checked above");
                if !instance.is_member_available(attr) {
                    return Err(SandboxError::ForbiddenAttributeAccess {
                            type_name: h.type_tag.clone(),
                            attr: attr.to_string(),
                        }
                            .into());
                }
                // Pre-registered instances are namespaced bindings, not
                // class-bound methods: no implicit `self`, same as modules.
                instance.call_member(attr, args).map_err(SandboxError::from).map_err(Into::into)
            }
            Value::Host(h) => {
                let class = self.registry.class_by_type_tag(&h.type_tag).ok_or_else(|| {
                        SandboxError::ForbiddenAttributeAccess {
                            type_name: h.type_tag.clone(),
                            attr: attr.to_string(),
                        }
                })?;
                if !class.is_member_available(attr) {
                    return Err(SandboxError::ForbiddenAttributeAccess {
                            type_name: h.type_tag.clone(),
                            attr: attr.to_string(),
                        }
                            .into());
                }
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(owner.clone());
                full.extend_from_slice(args);
                class.call_member(attr, &full).map_err(SandboxError::from).map_err(Into::into)
            }
            other => Err(SandboxError::ForbiddenAttributeAccess {
                    type_name: other.type_name().to_string(),
                    attr: attr.to_string(),
                }
                    .into()),
        }
    }
}

fn expr_as_target(expr: &Expr) -> Result<Target, EvalError> {
    match expr {
        Expr::Name(n) => Ok(Target::Name(n.clone())),
        Expr::Attribute { obj, attr } => Ok(Target::Attribute {
                obj: obj.clone(),
                attr: attr.clone(),
        }),
        Expr::Index { obj, index } => Ok(Target::Index {
                obj: obj.clone(),
                index: index.clone(),
        }),
        other => Err(SandboxError::Runtime {
                message: format!("{other:?} is not assignable"),
            }
                .into()),
    }
}


fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Bytes(b) => Value::Bytes(b.clone()),
    }
}

pub(crate) fn display_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bytes(b) => format!("{b:?}"),
        other => format!("{other:?}"),
    }
}

fn value_to_map_key(v: &Value) -> Result<String, EvalError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(SandboxError::TypeMismatch {
                expected: "str or int".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

pub(crate) fn iterate(v: &Value) -> Result<Vec<Value>, EvalError> {
    match v {
        Value::Array(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.clone()),
        Value::Map(m) => Ok(m.keys().cloned().map(Value::Str).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(SandboxError::TypeMismatch {
                expected: "iterable".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn get_index(container: &Value, index: &Value) -> Result<Value, EvalError> {
    match (container, index) {
        (Value::Array(items) | Value::Tuple(items), Value::Int(i)) => {
            let idx = normalize_index(*i, items.len())?;
            Ok(items[idx].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(*i, chars.len())?;
            Ok(Value::Str(chars[idx].to_string()))
        }
        (Value::Map(m), key) => {
            let k = value_to_map_key(key)?;
            m.get(&k)
                .cloned()
                .ok_or_else(|| SandboxError::KeyNotFound { key: k }.into())
        }
        (other, _) => Err(SandboxError::TypeMismatch {
                expected: "subscriptable".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn set_index(container: &mut Value, index: &Value, value: Value) -> Result<(), EvalError> {
    match (container, index) {
        (Value::Array(items), Value::Int(i)) => {
            let idx = normalize_index(*i, items.len())?;
            items[idx] = value;
            Ok(())
        }
        (Value::Map(m), key) => {
            let k = value_to_map_key(key)?;
            m.insert(k, value);
            Ok(())
        }
        (other, _) => Err(SandboxError::TypeMismatch {
                expected: "subscriptable".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn normalize_index(i: i64, len: usize) -> Result<usize, EvalError> {
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved as usize >= len {
        return Err(SandboxError::IndexOutOfRange { index: i }.into());
    }
    Ok(resolved as usize)
}

fn call_container_method(owner: &mut Value, method: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    match owner {
        Value::Array(items) => match method {
            "append" => {
                items.push(args.into_iter().next().unwrap_or(Value::Null));
                Ok(Value::Null)
            }
            "extend" => {
                let extra = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "extend() requires one argument".to_string(),
                })?;
                items.extend(iterate(&extra)?);
                Ok(Value::Null)
            }
            "pop" => items.pop().ok_or_else(|| SandboxError::IndexOutOfRange { index: -1 }.into()),
            "index" => {
                let needle = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "index() requires one argument".to_string(),
                })?;
                items
                    .iter()
                    .position(|v| *v == needle)
                    .map(|p| Value::Int(p as i64))
                    .ok_or_else(|| SandboxError::Runtime {
                        message: "value not found".to_string(),
                    }
                        .into())
            }
            "count" => {
                let needle = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "count() requires one argument".to_string(),
                })?;
                Ok(Value::Int(items.iter().filter(|v| **v == needle).count() as i64))
            }
            "clear" => {
                items.clear();
                Ok(Value::Null)
            }
            other => Err(SandboxError::ForbiddenAttributeAccess {
                    type_name: "array".to_string(),
                    attr: other.to_string(),
                }
                    .into()),
        },
        Value::Map(m) => match method {
            "get" => {
                let mut it = args.into_iter();
                let key = it.next().ok_or_else(|| SandboxError::Runtime {
                        message: "get() requires a key".to_string(),
                })?;
                let default = it.next().unwrap_or(Value::Null);
                let k = value_to_map_key(&key)?;
                Ok(m.get(&k).cloned().unwrap_or(default))
            }
            "keys" => Ok(Value::Array(m.keys().cloned().map(Value::Str).collect())),
            "values" => Ok(Value::Array(m.values().cloned().collect())),
            "items" => Ok(Value::Array(
                    m.iter().map(|(k, v)| Value::Tuple(vec![Value::Str(k.clone()), v.clone()])).collect(),
            )),
            "pop" => {
                let key = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "pop() requires a key".to_string(),
                })?;
                let k = value_to_map_key(&key)?;
                m.shift_remove(&k).ok_or(SandboxError::KeyNotFound { key: k }.into())
            }
            "clear" => {
                m.clear();
                Ok(Value::Null)
            }
            other => Err(SandboxError::ForbiddenAttributeAccess {
                    type_name: "map".to_string(),
                    attr: other.to_string(),
                }
                    .into()),
        },
        Value::Set(items) => match method {
            "add" => {
                let v = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "add() requires one argument".to_string(),
                })?;
                if !items.contains(&v) {
                    items.push(v);
                }
                Ok(Value::Null)
            }
            "remove" => {
                let v = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "remove() requires one argument".to_string(),
                })?;
                let before = items.len();
                items.retain(|x| *x != v);
                if items.len() == before {
                    return Err(SandboxError::KeyNotFound {
                            key: "<set element>".to_string(),
                        }
                            .into());
                }
                Ok(Value::Null)
            }
            "clear" => {
                items.clear();
                Ok(Value::Null)
            }
            other => Err(SandboxError::ForbiddenAttributeAccess {
                    type_name: "set".to_string(),
                    attr: other.to_string(),
                }
                    .into()),
        },
        Value::Str(s) => match method {
            "upper" => Ok(Value::Str(s.to_uppercase())),
            "lower" => Ok(Value::Str(s.to_lowercase())),
            "strip" => Ok(Value::Str(s.trim().to_string())),
            "split" => {
                let sep = match args.into_iter().next() {
                    Some(Value::Str(s)) => s,
                    _ => " ".to_string(),
                };
                Ok(Value::Array(s.split(&sep as &str).map(|p| Value::Str(p.to_string())).collect()))
            }
            "join" => {
                let items = args.into_iter().next().ok_or_else(|| SandboxError::Runtime {
                        message: "join() requires one argument".to_string(),
                })?;
                let parts = iterate(&items)?;
                let strs: Vec<String> = parts.iter().map(display_value).collect();
                Ok(Value::Str(strs.join(s)))
            }
            other => Err(SandboxError::ForbiddenAttributeAccess {
                    type_name: "str".to_string(),
                    attr: other.to_string(),
                }
                    .into()),
        },
        other => Err(SandboxError::TypeMismatch {
                expected: "container".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn eval_unop(op: UnaryOp, v: &Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(-i)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Ok(v.clone()),
        _ => Err(SandboxError::TypeMismatch {
                expected: "number".to_string(),
                got: v.type_name().to_string(),
            }
                .into()),
    }
}

fn eval_binop(op: BinOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    use BinOp::*;
    match (op, l, r) {
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Add, Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            out.extend(b.clone());
            Ok(Value::Array(out))
        }
        (_, Value::Int(a), Value::Int(b)) => int_binop(op, *a, *b),
        (_, Value::Float(_), _) | (_, _, Value::Float(_)) => {
            let a = as_float(l)?;
            let b = as_float(r)?;
            float_binop(op, a, b)
        }
        _ => Err(SandboxError::TypeMismatch {
                expected: "number".to_string(),
                got: format!("{}/{}", l.type_name(), r.type_name()),
            }
                .into()),
    }
}

fn as_float(v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(SandboxError::TypeMismatch {
                expected: "number".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}

fn int_binop(op: BinOp, a: i64, b: i64) -> Result<Value, EvalError> {
    use BinOp::*;
    match op {
        Add => Ok(Value::Int(a + b)),
        Sub => Ok(Value::Int(a - b)),
        Mul => Ok(Value::Int(a * b)),
        Div => {
            if b == 0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Float(a as f64 / b as f64))
        }
        FloorDiv => {
            if b == 0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Int(a.div_euclid(b)))
        }
        Mod => {
            if b == 0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Int(a.rem_euclid(b)))
        }
        Pow => Ok(Value::Int(a.pow(b.max(0) as u32))),
    }
}

fn float_binop(op: BinOp, a: f64, b: f64) -> Result<Value, EvalError> {
    use BinOp::*;
    match op {
        Add => Ok(Value::Float(a + b)),
        Sub => Ok(Value::Float(a - b)),
        Mul => Ok(Value::Float(a * b)),
        Div => {
            if b == 0.0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Float(a / b))
        }
        FloorDiv => {
            if b == 0.0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Float((a / b).floor()))
        }
        Mod => {
            if b == 0.0 {
                return Err(SandboxError::ZeroDivision.into());
            }
            Ok(Value::Float(a.rem_euclid(b)))
        }
        Pow => Ok(Value::Float(a.powf(b))),
    }
}

fn eval_cmp(op: CmpOp, l: &Value, r: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(l == r),
        CmpOp::NotEq => Ok(l != r),
        CmpOp::Lt => Ok(ordering(l, r)? == std::cmp::Ordering::Less),
        CmpOp::Lte => Ok(ordering(l, r)? != std::cmp::Ordering::Greater),
        CmpOp::Gt => Ok(ordering(l, r)? == std::cmp::Ordering::Greater),
        CmpOp::Gte => Ok(ordering(l, r)? != std::cmp::Ordering::Less),
        CmpOp::In => Ok(contains(r, l)?),
        CmpOp::NotIn => Ok(!contains(r, l)?),
    }
}

fn ordering(l: &Value, r: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => {
            let a = as_float(l)?;
            let b = as_float(r)?;
            Ok(a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal))
        }
    }
}

fn contains(container: &Value, needle: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Array(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.contains(needle)),
        Value::Map(m) => Ok(matches!(needle, Value::Str(s) if m.contains_key(s))),
        Value::Str(s) => match needle {
            Value::Str(n) => Ok(s.contains(n.as_str())),
            _ => Ok(false),
        },
        other => Err(SandboxError::TypeMismatch {
                expected: "container".to_string(),
                got: other.type_name().to_string(),
            }
                .into()),
    }
}
