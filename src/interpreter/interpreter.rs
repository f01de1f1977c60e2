//! Interpreter Orchestrator
//!
//! Owns the environment, the record manager, and the function table, and
//! drives program execution: BEGIN rules, the per-record loop over the
//! main rules, and END rules with the last record still latched.

use std::collections::HashMap;

use crate::ast::types::{ExprKind, Position, Program, Rule};
use crate::interpreter::environment::Environment;
use crate::interpreter::errors::{EvalError, Signal};
use crate::interpreter::expressions::{compile_regex, eval_bool};
use crate::interpreter::record::RecordManager;
use crate::interpreter::statements::exec_block;
use crate::interpreter::value::Value;
use crate::interpreter::variables;

/// One named input: a file's worth of records.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub lines: Vec<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self { name: name.into(), lines }
    }

    /// Split a text blob into records, one per line. A trailing newline
    /// does not produce a final empty record.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines.last().map_or(false, String::is_empty) {
            lines.pop();
        }
        Self { name: name.into(), lines }
    }
}

/// The owning interpreter instance: global environment, record state,
/// function table, and the accumulated output buffer.
pub struct Interpreter {
    pub env: Environment,
    pub records: RecordManager,
    pub functions: HashMap<String, crate::ast::types::FunctionDef>,
    pub output: String,
    pub call_depth: usize,
}

impl Interpreter {
    /// Create an interpreter with its well-known variables seeded. The
    /// options map may override the initial `FS`, `OFS`, and `OFMT`;
    /// other keys are ignored.
    pub fn new(options: &HashMap<String, String>) -> Self {
        let mut interp = Self {
            env: Environment::new(),
            records: RecordManager::new(),
            functions: HashMap::new(),
            output: String::new(),
            call_depth: 0,
        };

        let pos = Position::default();
        let defaults = [
            ("FS", " "),
            ("OFS", " "),
            ("ORS", "\n"),
            ("OFMT", "%.6g"),
            ("RSTART", "0"),
            ("RLENGTH", "-1"),
        ];
        for (name, value) in defaults {
            interp.env.set(name, Value::scalar(value), pos).expect("seeding globals");
        }
        for name in ["FS", "OFS", "OFMT"] {
            if let Some(value) = options.get(name) {
                interp
                    .env
                    .set(name, Value::scalar(value.clone()), pos)
                    .expect("seeding globals");
            }
        }
        interp
    }

    /// Run a whole program over zero or one input file: BEGIN rules,
    /// the per-record loop, then END rules.
    pub fn run(&mut self, program: &Program, input: Option<InputFile>) -> Result<(), EvalError> {
        self.run_begin(program)?;
        if let Some(input) = input {
            self.process_file(program, input)?;
        }
        self.run_end(program)
    }

    /// Execute the BEGIN rules in source order, with no record loaded.
    pub fn run_begin(&mut self, program: &Program) -> Result<(), EvalError> {
        self.load_functions(program);
        for rule in &program.begin {
            self.run_boundary_rule(rule, "BEGIN")?;
        }
        Ok(())
    }

    /// Point the record manager at an input and run the main rules over
    /// each of its records. `FNR` restarts at 1; `NR` keeps counting
    /// across files, so re-pointing at further files accumulates totals.
    pub fn process_file(&mut self, program: &Program, input: InputFile) -> Result<(), EvalError> {
        self.load_functions(program);
        if !self.switch_file(input) {
            return Ok(());
        }
        loop {
            self.run_record_rules(program)?;
            let fs = variables::current_fs(self);
            if !self.records.advance(&fs) {
                break;
            }
        }
        Ok(())
    }

    /// Re-point the record manager at another input: `FNR` resets, `NR`
    /// keeps counting. Returns whether a first record was loaded.
    pub fn switch_file(&mut self, input: InputFile) -> bool {
        let fs = variables::current_fs(self);
        self.records.open(&input.name, input.lines, &fs)
    }

    /// Execute the END rules in source order. The last record read stays
    /// latched, as END actions traditionally expect.
    pub fn run_end(&mut self, program: &Program) -> Result<(), EvalError> {
        self.load_functions(program);
        for rule in &program.end {
            self.run_boundary_rule(rule, "END")?;
        }
        Ok(())
    }

    /// Accumulated output so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Drain the accumulated output.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// The final global environment, for hosts and tests.
    pub fn globals(&self) -> &HashMap<String, Value> {
        self.env.globals()
    }

    fn load_functions(&mut self, program: &Program) {
        self.functions = program.functions.clone();
    }

    /// Run the main rules against the current record. A `next` raised
    /// anywhere inside an action (including through function frames)
    /// abandons the remaining rules for this record.
    fn run_record_rules(&mut self, program: &Program) -> Result<(), EvalError> {
        for rule in &program.main {
            if !self.predicate_matches(rule)? {
                continue;
            }
            match exec_block(self, &rule.body) {
                Ok(signal) => self.require_consumed(signal)?,
                Err(EvalError::NextRecord { .. }) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// A BEGIN or END rule body, where `next` has no record to skip.
    fn run_boundary_rule(&mut self, rule: &Rule, which: &str) -> Result<(), EvalError> {
        match exec_block(self, &rule.body) {
            Ok(signal) => self.require_consumed(signal),
            Err(EvalError::NextRecord { pos }) => Err(EvalError::program(
                pos,
                format!("next is not allowed inside {}", which),
            )),
            Err(err) => Err(err),
        }
    }

    /// An absent predicate matches every record; a bare regex literal
    /// matches when the record contains the pattern; anything else is
    /// evaluated for truth.
    fn predicate_matches(&mut self, rule: &Rule) -> Result<bool, EvalError> {
        match &rule.predicate {
            None => Ok(true),
            Some(expr) => match &expr.kind {
                ExprKind::Regex(pattern) => {
                    let re = compile_regex(pattern, expr.pos)?;
                    Ok(re.is_match(self.records.record()))
                }
                _ => eval_bool(self, expr),
            },
        }
    }

    /// A signal that reaches a rule boundary was never consumed.
    fn require_consumed(&self, signal: Signal) -> Result<(), EvalError> {
        match signal {
            Signal::Normal(_) => Ok(()),
            Signal::Break(pos) => Err(EvalError::program(pos, "break outside a loop")),
            Signal::Continue(pos) => Err(EvalError::program(pos, "continue outside a loop")),
            Signal::Return(pos, _) => Err(EvalError::program(pos, "return outside a function")),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
