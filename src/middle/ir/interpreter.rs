//! Executes IR directly, following labels and jumps, so programs can run
//! without a native assembler and linker.

use std::io::{BufRead, Write};

use hashbrown::HashMap;
use itertools::Itertools;

use crate::{
    error::{CompileResult, error_at},
    frontend::lexer::Location,
    middle::{
        builtin::Builtin,
        ir::{Function, InstructionKind, IrVar, LabelId, Module},
    },
};

/// Deepest chain of nested calls before execution is aborted
const MAX_CALL_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Unit,
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Unit => write!(f, "unit"),
        }
    }
}

/// Runs `main`, reading `read_int` lines from `input` and writing printed
/// values to `output`. Returns the value of the top-level statements.
pub fn interpret<R: BufRead, W: Write>(
    module: &Module,
    input: R,
    output: W,
) -> CompileResult<Value> {
    Interpreter::new(module, input, output).run()
}

#[derive(Debug)]
pub struct Interpreter<'module, R, W> {
    module: &'module Module,
    input: R,
    output: W,
    depth: usize,
}

impl<'module, R: BufRead, W: Write> Interpreter<'module, R, W> {
    pub fn new(module: &'module Module, input: R, output: W) -> Self {
        Self {
            module,
            input,
            output,
            depth: 0,
        }
    }

    pub fn run(&mut self) -> CompileResult<Value> {
        let Some(entry_point) = self.module.entry_point() else {
            return Err(error_at!(Runtime, None::<Location>, "module has no entry point"));
        };

        let value = self.call_function(entry_point, Vec::new(), Location::default())?;

        self.output
            .flush()
            .map_err(|e| error_at!(Runtime, None::<Location>, "failed to flush output: {e}"))?;

        Ok(value)
    }

    fn call_function(
        &mut self,
        function: &'module Function,
        arguments: Vec<Value>,
        location: Location,
    ) -> CompileResult<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(error_at!(
                Runtime,
                location,
                "call stack overflow while calling `{}`",
                function.name
            ));
        }

        if arguments.len() != function.parameters.len() {
            return Err(error_at!(
                Runtime,
                location,
                "`{}` takes {} argument(s) but {} were given",
                function.name,
                function.parameters.len(),
                arguments.len()
            ));
        }

        self.depth += 1;
        let result = self.execute(function, arguments);
        self.depth -= 1;

        result
    }

    fn execute(
        &mut self,
        function: &'module Function,
        arguments: Vec<Value>,
    ) -> CompileResult<Value> {
        let labels: HashMap<LabelId, usize> = function
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(position, instruction)| match instruction.kind {
                InstructionKind::Label(label) => Some((label, position)),
                _ => None,
            })
            .collect();

        let mut frame: HashMap<IrVar, Value> = function
            .parameters
            .iter()
            .copied()
            .zip(arguments)
            .collect();

        let mut position = 0;

        while let Some(instruction) = function.instructions.get(position) {
            let location = instruction.location;
            position += 1;

            match &instruction.kind {
                InstructionKind::LoadIntConst { value, destination } => {
                    frame.insert(*destination, Value::Int(*value));
                }
                InstructionKind::LoadBoolConst { value, destination } => {
                    frame.insert(*destination, Value::Bool(*value));
                }
                InstructionKind::Copy {
                    source,
                    destination,
                } => {
                    let value = read(&frame, *source, location)?;
                    frame.insert(*destination, value);
                }
                InstructionKind::Call {
                    function: callee,
                    arguments,
                    destination,
                } => {
                    let arguments = arguments
                        .iter()
                        .map(|argument| read(&frame, *argument, location))
                        .collect::<CompileResult<Vec<_>>>()?;

                    let value = self.call(*callee, arguments, location)?;
                    frame.insert(*destination, value);
                }
                InstructionKind::Label(_) => {}
                InstructionKind::Jump(label) => {
                    position = jump_target(&labels, *label, location)?;
                }
                InstructionKind::CondJump {
                    condition,
                    then_label,
                    else_label,
                } => {
                    let label = match read(&frame, *condition, location)? {
                        Value::Bool(true) => then_label,
                        Value::Bool(false) => else_label,
                        other => {
                            return Err(error_at!(
                                Runtime,
                                location,
                                "jump condition `{condition}` holds `{other}` instead of a Bool"
                            ));
                        }
                    };

                    position = jump_target(&labels, *label, location)?;
                }
                InstructionKind::Return(value) => return read(&frame, *value, location),
            }
        }

        read(&frame, function.result, Location::default())
    }

    fn call(
        &mut self,
        callee: IrVar,
        arguments: Vec<Value>,
        location: Location,
    ) -> CompileResult<Value> {
        let IrVar::Named(name) = callee else {
            return Err(error_at!(Runtime, location, "`{callee}` is not a function"));
        };

        if let Some(function) = self.module.function(name) {
            return self.call_function(function, arguments, location);
        }

        let Some(builtin) = Builtin::from_name(name.value()) else {
            return Err(error_at!(Runtime, location, "unknown function `{name}`"));
        };

        self.call_builtin(builtin, &arguments, location)
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        arguments: &[Value],
        location: Location,
    ) -> CompileResult<Value> {
        use Value::{Bool, Int};

        let value = match (builtin, arguments) {
            (Builtin::Add, [Int(a), Int(b)]) => Int(a.wrapping_add(*b)),
            (Builtin::Subtract, [Int(a), Int(b)]) => Int(a.wrapping_sub(*b)),
            (Builtin::Multiply, [Int(a), Int(b)]) => Int(a.wrapping_mul(*b)),
            (Builtin::Divide | Builtin::Modulus, [Int(_), Int(0)]) => {
                return Err(error_at!(Runtime, location, "division by zero"));
            }
            (Builtin::Divide, [Int(a), Int(b)]) => Int(a.wrapping_div(*b)),
            (Builtin::Modulus, [Int(a), Int(b)]) => Int(a.wrapping_rem(*b)),
            (Builtin::LessThan, [Int(a), Int(b)]) => Bool(a < b),
            (Builtin::GreaterThan, [Int(a), Int(b)]) => Bool(a > b),
            (Builtin::LessThanOrEqualTo, [Int(a), Int(b)]) => Bool(a <= b),
            (Builtin::GreaterThanOrEqualTo, [Int(a), Int(b)]) => Bool(a >= b),
            (Builtin::Equals, [a, b]) => Bool(a == b),
            (Builtin::NotEquals, [a, b]) => Bool(a != b),
            (Builtin::LogicalAnd, [Bool(a), Bool(b)]) => Bool(*a && *b),
            (Builtin::LogicalOr, [Bool(a), Bool(b)]) => Bool(*a || *b),
            (Builtin::LogicalNot, [Bool(a)]) => Bool(!a),
            (Builtin::Negate, [Int(a)]) => Int(a.wrapping_neg()),
            (Builtin::PrintInt, [Int(a)]) => {
                self.print(a, location)?;
                Value::Unit
            }
            (Builtin::PrintBool, [Bool(a)]) => {
                self.print(a, location)?;
                Value::Unit
            }
            (Builtin::ReadInt, []) => Int(self.read_int(location)?),
            _ => {
                return Err(error_at!(
                    Runtime,
                    location,
                    "`{builtin}` cannot be applied to ({})",
                    arguments.iter().join(", ")
                ));
            }
        };

        Ok(value)
    }

    fn print(&mut self, value: impl core::fmt::Display, location: Location) -> CompileResult<()> {
        writeln!(self.output, "{value}")
            .map_err(|e| error_at!(Runtime, location, "failed to write output: {e}"))
    }

    fn read_int(&mut self, location: Location) -> CompileResult<i64> {
        let mut line = String::new();

        let bytes_read = self
            .input
            .read_line(&mut line)
            .map_err(|e| error_at!(Runtime, location, "failed to read input: {e}"))?;

        if bytes_read == 0 {
            return Err(error_at!(Runtime, location, "`read_int` reached end of input"));
        }

        line.trim().parse().map_err(|_| {
            error_at!(
                Runtime,
                location,
                "`read_int` expected an integer but read `{}`",
                line.trim()
            )
        })
    }
}

fn read(frame: &HashMap<IrVar, Value>, variable: IrVar, location: Location) -> CompileResult<Value> {
    if variable == IrVar::Unit {
        return Ok(Value::Unit);
    }

    frame.get(&variable).copied().ok_or_else(|| {
        error_at!(
            Runtime,
            location,
            "`{variable}` is read before it is assigned"
        )
    })
}

fn jump_target(
    labels: &HashMap<LabelId, usize>,
    label: LabelId,
    location: Location,
) -> CompileResult<usize> {
    labels
        .get(&label)
        .copied()
        .ok_or_else(|| error_at!(Runtime, location, "jump to undefined label `{label}`"))
}

#[cfg(test)]
mod tests;
