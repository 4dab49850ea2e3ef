//! The rendered view of "the current task's signature and arguments"
//!.

use agentrt_core::Value;

/// What the renderer shows the oracle about the task it is being asked to
/// drive to a terminal signal.
#[derive(Debug, Clone)]
pub struct TaskSignature {
    pub name: String,
    pub args: Vec<(String, Value)>,
    pub return_type: Option<String>,
}

impl TaskSignature {
    pub fn render_line(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|(name, value)| format!("{}={}", name, render_value(value)))
            .collect::<Vec<_>>()
            .join(", ");
        match &self.return_type {
            Some(rt) => format!("task {}({}) -> {}", self.name, args, rt),
            None => format!("task {}({})", self.name, args),
        }
    }
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("{:?}", s),
        _ => "<value>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_arguments_and_return_type() {
        let sig = TaskSignature {
            name: "add".into(),
            args: vec![("a".into(), Value::Int(1)), ("b".into(), Value::Int(2))],
            return_type: Some("int".into()),
        };
        assert_eq!(sig.render_line(), "task add(a=1, b=2) -> int");
    }
}
