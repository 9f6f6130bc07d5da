//! Template execution
//!
//! Walks the node tree against a borrowed `serde_json::Value`. Values stay
//! borrowed from the data wherever possible; only helper results and
//! literals are owned.

use super::funcs::{call_builtin, kind, truthy, FuncMap};
use super::parser::{Command, Expr, Node, Pipeline};
use serde_json::Value;
use std::borrow::Cow;

/// An execution error and the line of the action that raised it
pub(crate) struct ExecFailure {
    pub line: usize,
    pub message: String,
}

type Eval<'d> = Result<Cow<'d, Value>, String>;

pub(crate) struct Exec<'t, 'd> {
    funcs: &'t FuncMap,
    vars: Vec<(&'t str, Cow<'d, Value>)>,
    out: String,
}

impl<'t, 'd> Exec<'t, 'd> {
    pub(crate) fn new(funcs: &'t FuncMap, root: &'d Value) -> Self {
        Self {
            funcs,
            vars: vec![("$", Cow::Borrowed(root))],
            out: String::new(),
        }
    }

    pub(crate) fn run(mut self, nodes: &'t [Node], root: &'d Value) -> Result<String, ExecFailure> {
        self.walk(nodes, &Cow::Borrowed(root))?;
        Ok(self.out)
    }

    fn walk(&mut self, nodes: &'t [Node], dot: &Cow<'d, Value>) -> Result<(), ExecFailure> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Action { pipeline, line } => {
                    let value = self.eval_pipeline(pipeline, dot).map_err(|m| fail(*line, m))?;
                    if pipeline.decl.is_empty() {
                        print_value(&mut self.out, &value);
                    }
                }
                Node::If {
                    pipeline,
                    then,
                    otherwise,
                    line,
                } => {
                    let mark = self.vars.len();
                    let cond = self.eval_pipeline(pipeline, dot).map_err(|m| fail(*line, m))?;
                    let branch = if truthy(&cond) { then } else { otherwise };
                    self.walk(branch, dot)?;
                    self.vars.truncate(mark);
                }
                Node::With {
                    pipeline,
                    then,
                    otherwise,
                    line,
                } => {
                    let mark = self.vars.len();
                    let value = self.eval_pipeline(pipeline, dot).map_err(|m| fail(*line, m))?;
                    if truthy(&value) {
                        self.walk(then, &value)?;
                    } else {
                        self.walk(otherwise, dot)?;
                    }
                    self.vars.truncate(mark);
                }
                Node::Range {
                    pipeline,
                    then,
                    otherwise,
                    line,
                } => {
                    let value = self
                        .eval_commands(&pipeline.commands, dot)
                        .map_err(|m| fail(*line, m))?;
                    let items = range_items(value).map_err(|m| fail(*line, m))?;
                    if items.is_empty() {
                        self.walk(otherwise, dot)?;
                        continue;
                    }
                    for (key, elem) in items {
                        let mark = self.vars.len();
                        match pipeline.decl.as_slice() {
                            [value_var] => self.vars.push((value_var.as_str(), elem.clone())),
                            [key_var, value_var] => {
                                self.vars.push((key_var.as_str(), key));
                                self.vars.push((value_var.as_str(), elem.clone()));
                            }
                            _ => {}
                        }
                        self.walk(then, &elem)?;
                        self.vars.truncate(mark);
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate a pipeline and bind its declared variable, if any
    fn eval_pipeline(&mut self, pipeline: &'t Pipeline, dot: &Cow<'d, Value>) -> Eval<'d> {
        let value = self.eval_commands(&pipeline.commands, dot)?;
        if let Some(name) = pipeline.decl.first() {
            self.vars.push((name.as_str(), value.clone()));
        }
        Ok(value)
    }

    /// Run each command, passing the previous result as the final argument of the next
    fn eval_commands(&self, commands: &[Command], dot: &Cow<'d, Value>) -> Eval<'d> {
        let mut piped: Option<Cow<'d, Value>> = None;
        for (stage, command) in commands.iter().enumerate() {
            piped = Some(self.eval_command(command, dot, piped.take(), stage)?);
        }
        piped.ok_or_else(|| "missing value for command".to_string())
    }

    fn eval_command(
        &self,
        command: &Command,
        dot: &Cow<'d, Value>,
        piped: Option<Cow<'d, Value>>,
        stage: usize,
    ) -> Eval<'d> {
        match command.args.split_first() {
            Some((Expr::Call(name), args)) => self.call(name, args, dot, piped),
            Some((operand, [])) if piped.is_none() => self.eval_expr(operand, dot),
            Some((_, [])) => Err(format!(
                "non executable command in pipeline stage {}",
                stage + 1
            )),
            Some(_) => Err("can't give argument to non-function".to_string()),
            None => Err("empty command".to_string()),
        }
    }

    fn eval_expr(&self, expr: &Expr, dot: &Cow<'d, Value>) -> Eval<'d> {
        match expr {
            Expr::Dot => Ok(dot.clone()),
            Expr::Variable(name) => self.lookup(name),
            Expr::Field(receiver, name) => {
                let receiver = self.eval_expr(receiver, dot)?;
                field(receiver, name)
            }
            Expr::Call(name) => self.call(name, &[], dot, None),
            Expr::Pipeline(pipeline) => self.eval_commands(&pipeline.commands, dot),
            Expr::Int(v) => Ok(Cow::Owned(Value::from(*v))),
            Expr::Float(v) => Ok(Cow::Owned(
                serde_json::Number::from_f64(*v)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            )),
            Expr::Str(s) => Ok(Cow::Owned(Value::String(s.clone()))),
            Expr::Bool(b) => Ok(Cow::Owned(Value::Bool(*b))),
            Expr::Nil => Ok(Cow::Owned(Value::Null)),
        }
    }

    fn lookup(&self, name: &str) -> Eval<'d> {
        self.vars
            .iter()
            .rev()
            .find(|(var, _)| *var == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| format!("undefined variable: {}", name))
    }

    fn call(
        &self,
        name: &str,
        args: &[Expr],
        dot: &Cow<'d, Value>,
        piped: Option<Cow<'d, Value>>,
    ) -> Eval<'d> {
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            values.push(self.eval_expr(arg, dot)?);
        }
        values.extend(piped);

        if let Some(helper) = self.funcs.get(name) {
            let refs: Vec<&Value> = values.iter().map(|v| v.as_ref()).collect();
            return helper(&refs)
                .map(Cow::Owned)
                .map_err(|e| format!("error calling {}: {}", name, e));
        }
        call_builtin(name, values).map_err(|e| format!("error calling {}: {}", name, e))
    }
}

fn fail(line: usize, message: String) -> ExecFailure {
    ExecFailure { line, message }
}

fn field<'d>(receiver: Cow<'d, Value>, name: &str) -> Eval<'d> {
    match receiver {
        Cow::Borrowed(Value::Object(map)) => map
            .get(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| format!("can't evaluate field {}", name)),
        Cow::Owned(Value::Object(mut map)) => map
            .remove(name)
            .map(Cow::Owned)
            .ok_or_else(|| format!("can't evaluate field {}", name)),
        Cow::Borrowed(Value::Null) | Cow::Owned(Value::Null) => {
            Err(format!("nil pointer evaluating field {}", name))
        }
        other => Err(format!(
            "can't evaluate field {} in type {}",
            name,
            kind(&other)
        )),
    }
}

type RangeItem<'d> = (Cow<'d, Value>, Cow<'d, Value>);

/// (key, element) pairs: array positions or map keys in key order
fn range_items(value: Cow<'_, Value>) -> Result<Vec<RangeItem<'_>>, String> {
    match value {
        Cow::Borrowed(Value::Array(items)) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, v)| (Cow::Owned(Value::from(i)), Cow::Borrowed(v)))
            .collect()),
        Cow::Borrowed(Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (Cow::Owned(Value::String(k.clone())), Cow::Borrowed(v)))
            .collect()),
        Cow::Owned(Value::Array(items)) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Cow::Owned(Value::from(i)), Cow::Owned(v)))
            .collect()),
        Cow::Owned(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| (Cow::Owned(Value::String(k)), Cow::Owned(v)))
            .collect()),
        Cow::Borrowed(Value::Null) | Cow::Owned(Value::Null) => Ok(Vec::new()),
        other => Err(format!("range can't iterate over {}", kind(&other))),
    }
}

fn print_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Null => out.push_str("<no value>"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        composite => out.push_str(&composite.to_string()),
    }
}
