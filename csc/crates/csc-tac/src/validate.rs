//! Post-generation shape checks on the emitted TAC.
//!
//! Four checks, each scoped to one function:
//!
//! 1. every referenced label is defined exactly once
//! 2. every temporary is written before it is read (in stream order)
//! 3. `@function`/`endfunc` pairs match and every function reaches a
//!    `return`
//! 4. every `call`/`new` has its `n` `param` pushes available
//!
//! Violations become `tac` diagnostics in the driver; an empty result
//! means the stream is well-formed.

use crate::tac::{Instr, Operand};
use rustc_hash::{FxHashMap, FxHashSet};

/// Validate an instruction stream, returning human-readable violations
pub fn validate(instrs: &[Instr]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut current: Option<FunctionChecker> = None;

    for instr in instrs {
        match instr {
            Instr::FuncBegin { name, .. } => {
                if let Some(open) = &current {
                    errors.push(format!(
                        "function `{}` is missing its `endfunc` before `{}` begins",
                        open.name, name
                    ));
                }
                current = Some(FunctionChecker::new(name));
            }
            Instr::FuncEnd => match current.take() {
                Some(checker) => checker.finish(&mut errors),
                None => errors.push("`endfunc` without a matching `@function`".to_string()),
            },
            other => match &mut current {
                Some(checker) => checker.check(other),
                None => errors.push(format!("instruction outside any function: `{}`", other)),
            },
        }
    }

    if let Some(open) = current {
        errors.push(format!("function `{}` is missing its `endfunc`", open.name));
    }

    errors
}

/// Per-function state for the four checks
struct FunctionChecker {
    name: String,
    defined_labels: FxHashMap<String, u32>,
    referenced_labels: FxHashSet<String>,
    written_temps: FxHashSet<u32>,
    temp_errors: Vec<String>,
    pending_params: usize,
    has_return: bool,
    call_errors: Vec<String>,
}

impl FunctionChecker {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            defined_labels: FxHashMap::default(),
            referenced_labels: FxHashSet::default(),
            written_temps: FxHashSet::default(),
            temp_errors: Vec::new(),
            pending_params: 0,
            has_return: false,
            call_errors: Vec::new(),
        }
    }

    fn check(&mut self, instr: &Instr) {
        match instr {
            Instr::Label(label) => {
                *self.defined_labels.entry(label.0.clone()).or_insert(0) += 1;
            }
            Instr::Goto(label) => {
                self.referenced_labels.insert(label.0.clone());
            }
            Instr::If { cond, target } | Instr::IfFalse { cond, target } => {
                self.read(cond);
                self.referenced_labels.insert(target.0.clone());
            }
            Instr::TryBegin(label) => {
                self.referenced_labels.insert(label.0.clone());
            }
            Instr::TryEnd => {}
            Instr::Binary { dst, lhs, rhs, .. } => {
                self.read(lhs);
                self.read(rhs);
                self.write(dst);
            }
            Instr::Unary { dst, operand, .. } => {
                self.read(operand);
                self.write(dst);
            }
            Instr::Copy { dst, src } => {
                self.read(src);
                self.write(dst);
            }
            Instr::IndexedLoad { dst, array, index } => {
                self.read(array);
                self.read(index);
                self.write(dst);
            }
            Instr::IndexedStore { array, index, src } => {
                self.read(array);
                self.read(index);
                self.read(src);
            }
            Instr::FieldLoad { dst, object, .. } => {
                self.read(object);
                self.write(dst);
            }
            Instr::FieldStore { object, src, .. } => {
                self.read(object);
                self.read(src);
            }
            Instr::Param(operand) => {
                self.read(operand);
                self.pending_params += 1;
            }
            Instr::Call { dst, func, argc } => {
                self.consume_params(func, *argc);
                if let Some(dst) = dst {
                    self.write(dst);
                }
            }
            Instr::New { dst, class, argc } => {
                self.consume_params(class, *argc);
                self.write(dst);
            }
            Instr::Return(value) => {
                if let Some(value) = value {
                    self.read(value);
                }
                self.has_return = true;
            }
            Instr::FuncBegin { .. } | Instr::FuncEnd => unreachable!("handled by caller"),
        }
    }

    fn read(&mut self, operand: &Operand) {
        if let Some(id) = operand.temp_id() {
            if !self.written_temps.contains(&id) {
                self.temp_errors.push(format!(
                    "function `{}`: temporary t{} is read before it is written",
                    self.name, id
                ));
            }
        }
    }

    fn write(&mut self, operand: &Operand) {
        if let Some(id) = operand.temp_id() {
            self.written_temps.insert(id);
        }
    }

    fn consume_params(&mut self, callee: &str, argc: usize) {
        if self.pending_params < argc {
            self.call_errors.push(format!(
                "function `{}`: call to `{}` needs {} param(s) but only {} are pending",
                self.name, callee, argc, self.pending_params
            ));
            self.pending_params = 0;
        } else {
            self.pending_params -= argc;
        }
    }

    fn finish(self, errors: &mut Vec<String>) {
        for (label, count) in &self.defined_labels {
            if *count > 1 {
                errors.push(format!(
                    "function `{}`: label `{}` is defined {} times",
                    self.name, label, count
                ));
            }
        }
        for label in &self.referenced_labels {
            if !self.defined_labels.contains_key(label) {
                errors.push(format!(
                    "function `{}`: jump to undefined label `{}`",
                    self.name, label
                ));
            }
        }
        errors.extend(self.temp_errors);
        if !self.has_return {
            errors.push(format!("function `{}` has no `return`", self.name));
        }
        if self.pending_params != 0 {
            errors.push(format!(
                "function `{}`: {} pushed param(s) were never consumed by a call",
                self.name, self.pending_params
            ));
        }
        errors.extend(self.call_errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;

    fn func(body: Vec<Instr>) -> Vec<Instr> {
        let mut instrs = vec![Instr::FuncBegin {
            name: "f".into(),
            params: vec![],
            frame_size: 0,
        }];
        instrs.extend(body);
        instrs.push(Instr::FuncEnd);
        instrs
    }

    #[test]
    fn test_clean_function_passes() {
        let instrs = func(vec![
            Instr::Copy {
                dst: Operand::Temp(0),
                src: Operand::ConstInt(1),
            },
            Instr::Param(Operand::Temp(0)),
            Instr::Call {
                dst: None,
                func: "print".into(),
                argc: 1,
            },
            Instr::Return(None),
        ]);
        assert!(validate(&instrs).is_empty());
    }

    #[test]
    fn test_undefined_label() {
        let instrs = func(vec![
            Instr::Goto(Label("Lnowhere0".into())),
            Instr::Return(None),
        ]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("undefined label")));
    }

    #[test]
    fn test_duplicate_label() {
        let instrs = func(vec![
            Instr::Label(Label("Lend0".into())),
            Instr::Label(Label("Lend0".into())),
            Instr::Return(None),
        ]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("defined 2 times")));
    }

    #[test]
    fn test_temp_read_before_write() {
        let instrs = func(vec![
            Instr::Param(Operand::Temp(3)),
            Instr::Call {
                dst: None,
                func: "print".into(),
                argc: 1,
            },
            Instr::Return(None),
        ]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("t3 is read before")));
    }

    #[test]
    fn test_missing_return() {
        let instrs = func(vec![Instr::Copy {
            dst: Operand::Temp(0),
            src: Operand::ConstInt(1),
        }]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("no `return`")));
    }

    #[test]
    fn test_call_without_enough_params() {
        let instrs = func(vec![
            Instr::Call {
                dst: None,
                func: "print".into(),
                argc: 1,
            },
            Instr::Return(None),
        ]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("needs 1 param")));
    }

    #[test]
    fn test_leftover_params() {
        let instrs = func(vec![
            Instr::Param(Operand::ConstInt(1)),
            Instr::Return(None),
        ]);
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("never consumed")));
    }

    #[test]
    fn test_unterminated_function() {
        let instrs = vec![Instr::FuncBegin {
            name: "f".into(),
            params: vec![],
            frame_size: 0,
        }];
        let errors = validate(&instrs);
        assert!(errors.iter().any(|e| e.contains("missing its `endfunc`")));
    }
}
