//! # ASTC Virtual Machine
//!
//! A stack interpreter over the in-memory instruction vector.
//!
//! ## Execution model
//!
//! Single-threaded, synchronous, non-suspendable: `execute` runs to
//! completion or returns an error. One instruction advances per fetch loop
//! iteration. State transitions: ready → running → stopped | error.
//!
//! ## Control flow
//!
//! A prepass builds a jump map pairing every `block`/`loop`/`if`/`func` with
//! its `else`/`end`, rejecting malformed nesting before execution starts.
//! At runtime a control-frame stack mirrors the static nesting: `br d`
//! resolves to the d-th enclosing frame — loop frames branch back to the
//! loop head, block/if frames branch past their `end`.
//!
//! ## Calls
//!
//! `call` on a `function` symbol pushes a call frame (return pc, locals
//! base, control height) and allocates the callee's slots; `return` pops it.
//! A `return` with no frames left stops the machine with the returned value
//! as the program result. `call` on a `host` symbol pops the packed argument
//! cells and dispatches through the FFI registry.
//!
//! ## Memory
//!
//! `string.const` pushes the host address of the interned bytes, so host
//! calls receive real C pointers; loads and stores operate on host addresses
//! (data segment or FFI-allocated). A null address is a `VmError`, as are
//! division by zero, stack under/overflow and unknown opcodes.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::bytecode::{unpack_call_operand, AstcProgram, Opcode, Operand, SymbolKind};
use crate::ffi::FfiRegistry;

/// Operand stack capacity in cells.
pub const STACK_CAPACITY: usize = 64 * 1024;

/// Legacy general-register count kept for the packed-loader path.
pub const REGISTER_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Ready,
    Running,
    Stopped,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VmError {
    pub pc: usize,
    pub kind: VmErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmErrorKind {
    StackUnderflow,
    StackOverflow,
    DivisionByZero,
    UnknownOpcode,
    MalformedControl,
    UnknownSymbol,
    BadStringOffset,
    NullPointer,
    HostCall,
    Unreachable,
}

impl VmError {
    fn new(pc: usize, kind: VmErrorKind, message: impl Into<String>) -> Self {
        Self {
            pc,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VM error at pc {}: {}", self.pc, self.message)
    }
}

impl std::error::Error for VmError {}

/// Static jump targets for one structured-control opcode.
#[derive(Debug, Clone, Copy)]
struct JumpInfo {
    else_pc: Option<usize>,
    end_pc: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlKind {
    Block,
    Loop,
    If,
    Func,
}

#[derive(Debug, Clone, Copy)]
struct ControlFrame {
    kind: ControlKind,
    head_pc: usize,
    end_pc: usize,
}

#[derive(Debug, Clone, Copy)]
struct CallFrame {
    /// `usize::MAX` marks the root frame.
    return_pc: usize,
    locals_base: usize,
    control_base: usize,
}

pub struct Vm<'a> {
    program: &'a AstcProgram,
    ffi: &'a FfiRegistry,
    stack: Vec<i64>,
    locals: Vec<i64>,
    globals: Vec<i64>,
    frames: Vec<CallFrame>,
    control: Vec<ControlFrame>,
    /// Legacy register file; the packed-loader path still addresses it.
    pub regs: [i64; REGISTER_COUNT],
    pc: usize,
    state: VmState,
    error: Option<VmError>,
}

impl<'a> Vm<'a> {
    pub fn new(program: &'a AstcProgram, ffi: &'a FfiRegistry) -> Self {
        Self {
            program,
            ffi,
            stack: Vec::new(),
            locals: Vec::new(),
            // Each execution starts from the program's initial global
            // values; re-running the same program is deterministic.
            globals: program.globals.clone(),
            frames: Vec::new(),
            control: Vec::new(),
            regs: [0; REGISTER_COUNT],
            pc: 0,
            state: VmState::Ready,
            error: None,
        }
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// The last error message, if execution failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Run the program from its entry point to completion.
    ///
    /// Returns the program result: the value of the final `return`, or the
    /// top of stack when execution falls off the end of the instruction
    /// vector (0 if the stack is empty).
    pub fn execute(&mut self) -> Result<i64, VmError> {
        match self.run() {
            Ok(value) => {
                self.state = VmState::Stopped;
                Ok(value)
            }
            Err(err) => {
                self.state = VmState::Error;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<i64, VmError> {
        let jump_map = build_jump_map(self.program)?;
        self.state = VmState::Running;
        self.pc = self.program.entry_point;
        self.globals = self.program.globals.clone();
        self.stack.clear();
        self.locals.clear();
        self.frames.clear();
        self.control.clear();

        loop {
            let Some(inst) = self.program.instructions.get(self.pc) else {
                // Fell off the end of the program.
                return Ok(self.stack.last().copied().unwrap_or(0));
            };
            let pc = self.pc;
            let opcode = inst.opcode;
            let operand = inst.operand;
            self.pc += 1;

            match opcode {
                Opcode::Nop
                | Opcode::C99Compile
                | Opcode::C99Parse
                | Opcode::C99Codegen
                | Opcode::C99Optimize
                | Opcode::C99Link => {}

                Opcode::Unreachable => {
                    return Err(VmError::new(
                        pc,
                        VmErrorKind::Unreachable,
                        "unreachable executed",
                    ));
                }

                Opcode::Block | Opcode::Loop => {
                    let info = jump_map[&pc];
                    self.control.push(ControlFrame {
                        kind: if opcode == Opcode::Block {
                            ControlKind::Block
                        } else {
                            ControlKind::Loop
                        },
                        head_pc: pc,
                        end_pc: info.end_pc,
                    });
                }

                Opcode::If => {
                    let info = jump_map[&pc];
                    let cond = self.pop(pc)?;
                    if cond != 0 {
                        self.control.push(ControlFrame {
                            kind: ControlKind::If,
                            head_pc: pc,
                            end_pc: info.end_pc,
                        });
                    } else if let Some(else_pc) = info.else_pc {
                        self.control.push(ControlFrame {
                            kind: ControlKind::If,
                            head_pc: pc,
                            end_pc: info.end_pc,
                        });
                        self.pc = else_pc + 1;
                    } else {
                        self.pc = info.end_pc + 1;
                    }
                }

                Opcode::Else => {
                    // Fell out of the then-branch: jump to the matching end,
                    // which pops the if frame.
                    let frame = self.control.last().copied().ok_or_else(|| {
                        VmError::new(pc, VmErrorKind::MalformedControl, "else outside if")
                    })?;
                    self.pc = frame.end_pc;
                }

                Opcode::End => {
                    let frame = self.control.pop().ok_or_else(|| {
                        VmError::new(pc, VmErrorKind::MalformedControl, "end without open block")
                    })?;
                    if frame.kind == ControlKind::Func {
                        // A function body fell off its end without an
                        // explicit return: C99 gives main an implicit 0.
                        if let Some(result) = self.do_return(0)? {
                            return Ok(result);
                        }
                    }
                }

                Opcode::Br => {
                    let depth = self.index_operand(pc, operand)?;
                    self.branch(pc, depth)?;
                }

                Opcode::BrIf => {
                    let depth = self.index_operand(pc, operand)?;
                    let cond = self.pop(pc)?;
                    if cond != 0 {
                        self.branch(pc, depth)?;
                    }
                }

                Opcode::Return => {
                    let value = self.pop(pc)?;
                    if let Some(result) = self.do_return(value)? {
                        return Ok(result);
                    }
                }

                Opcode::Func => {
                    // Executed only when the machine starts at a function
                    // entry; `call` jumps past the marker instead.
                    let info = jump_map[&pc];
                    let function = self
                        .program
                        .functions
                        .iter()
                        .find(|f| f.entry_pc == pc)
                        .ok_or_else(|| {
                            VmError::new(
                                pc,
                                VmErrorKind::UnknownSymbol,
                                "func marker without function-table entry",
                            )
                        })?;
                    self.frames.push(CallFrame {
                        return_pc: usize::MAX,
                        locals_base: self.locals.len(),
                        control_base: self.control.len(),
                    });
                    self.locals
                        .resize(self.locals.len() + function.local_count as usize, 0);
                    self.control.push(ControlFrame {
                        kind: ControlKind::Func,
                        head_pc: pc,
                        end_pc: info.end_pc,
                    });
                }

                Opcode::Call => {
                    let packed = self.index_operand(pc, operand)?;
                    let (symbol, argc) = unpack_call_operand(packed);
                    self.do_call(pc, symbol, argc as usize)?;
                }

                Opcode::Drop => {
                    self.pop(pc)?;
                }

                Opcode::LocalGet => {
                    let slot = self.local_slot(pc, operand)?;
                    let value = self.locals[slot];
                    self.push(pc, value)?;
                }
                Opcode::LocalSet => {
                    let slot = self.local_slot(pc, operand)?;
                    let value = self.pop(pc)?;
                    self.locals[slot] = value;
                }
                Opcode::LocalTee => {
                    let slot = self.local_slot(pc, operand)?;
                    let value = *self.stack.last().ok_or_else(|| {
                        VmError::new(pc, VmErrorKind::StackUnderflow, "tee on empty stack")
                    })?;
                    self.locals[slot] = value;
                }

                Opcode::GlobalGet => {
                    let index = self.index_operand(pc, operand)? as usize;
                    let value = *self.globals.get(index).ok_or_else(|| {
                        VmError::new(
                            pc,
                            VmErrorKind::UnknownSymbol,
                            format!("global index {} out of range", index),
                        )
                    })?;
                    self.push(pc, value)?;
                }
                Opcode::GlobalSet => {
                    let index = self.index_operand(pc, operand)? as usize;
                    let value = self.pop(pc)?;
                    match self.globals.get_mut(index) {
                        Some(slot) => *slot = value,
                        None => {
                            return Err(VmError::new(
                                pc,
                                VmErrorKind::UnknownSymbol,
                                format!("global index {} out of range", index),
                            ));
                        }
                    }
                }

                Opcode::I32Const => {
                    let value = match operand {
                        Operand::I32(v) => v as i64,
                        other => other.as_i64(),
                    };
                    self.push(pc, value)?;
                }
                Opcode::I64Const => {
                    self.push(pc, operand.as_i64())?;
                }
                Opcode::F32Const | Opcode::F64Const => {
                    // Float cells carry raw bit patterns.
                    self.push(pc, operand.as_i64())?;
                }
                Opcode::StringConst => {
                    let offset = self.index_operand(pc, operand)?;
                    if self.program.data_cstr(offset).is_none() {
                        return Err(VmError::new(
                            pc,
                            VmErrorKind::BadStringOffset,
                            format!("string.const offset {} has no NUL in bounds", offset),
                        ));
                    }
                    let address = unsafe { self.program.data.as_ptr().add(offset as usize) };
                    self.push(pc, address as i64)?;
                }

                Opcode::I32Load => {
                    let address = self.pop_address(pc)?;
                    let value = unsafe { std::ptr::read_unaligned(address as *const i32) };
                    self.push(pc, value as i64)?;
                }
                Opcode::I64Load => {
                    let address = self.pop_address(pc)?;
                    let value = unsafe { std::ptr::read_unaligned(address as *const i64) };
                    self.push(pc, value)?;
                }
                Opcode::F32Load => {
                    let address = self.pop_address(pc)?;
                    let bits = unsafe { std::ptr::read_unaligned(address as *const u32) };
                    self.push(pc, bits as i64)?;
                }
                Opcode::F64Load => {
                    let address = self.pop_address(pc)?;
                    let bits = unsafe { std::ptr::read_unaligned(address as *const u64) };
                    self.push(pc, bits as i64)?;
                }

                Opcode::I32Store => {
                    let value = self.pop(pc)?;
                    let address = self.pop_address(pc)?;
                    unsafe { std::ptr::write_unaligned(address as *mut i32, value as i32) };
                }
                Opcode::I64Store | Opcode::F64Store => {
                    let value = self.pop(pc)?;
                    let address = self.pop_address(pc)?;
                    unsafe { std::ptr::write_unaligned(address as *mut i64, value) };
                }
                Opcode::F32Store => {
                    let value = self.pop(pc)?;
                    let address = self.pop_address(pc)?;
                    unsafe { std::ptr::write_unaligned(address as *mut u32, value as u32) };
                }
                Opcode::I32Store8 => {
                    let value = self.pop(pc)?;
                    let address = self.pop_address(pc)?;
                    unsafe { std::ptr::write_unaligned(address as *mut u8, value as u8) };
                }
                Opcode::I32Store16 => {
                    let value = self.pop(pc)?;
                    let address = self.pop_address(pc)?;
                    unsafe { std::ptr::write_unaligned(address as *mut u16, value as u16) };
                }

                Opcode::I32Eqz => {
                    let value = self.pop(pc)? as i32;
                    self.push(pc, (value == 0) as i64)?;
                }

                Opcode::I32Add | Opcode::I32Sub | Opcode::I32Mul => {
                    // Cell-width arithmetic: subscript lowering routes host
                    // pointers through these opcodes.
                    let rhs = self.pop(pc)?;
                    let lhs = self.pop(pc)?;
                    let result = match opcode {
                        Opcode::I32Add => lhs.wrapping_add(rhs),
                        Opcode::I32Sub => lhs.wrapping_sub(rhs),
                        _ => lhs.wrapping_mul(rhs),
                    };
                    self.push(pc, result)?;
                }

                Opcode::I32DivS
                | Opcode::I32DivU
                | Opcode::I32RemS
                | Opcode::I32RemU
                | Opcode::I32And
                | Opcode::I32Or
                | Opcode::I32Xor
                | Opcode::I32Shl
                | Opcode::I32ShrS
                | Opcode::I32ShrU
                | Opcode::I32Eq
                | Opcode::I32Ne
                | Opcode::I32LtS
                | Opcode::I32LtU
                | Opcode::I32GtS
                | Opcode::I32GtU
                | Opcode::I32LeS
                | Opcode::I32LeU
                | Opcode::I32GeS
                | Opcode::I32GeU => {
                    let rhs = self.pop(pc)? as i32;
                    let lhs = self.pop(pc)? as i32;
                    let result = binary_i32(pc, opcode, lhs, rhs)?;
                    self.push(pc, result as i64)?;
                }

                Opcode::I32WrapI64 => {
                    let value = self.pop(pc)?;
                    self.push(pc, (value as i32) as i64)?;
                }
                Opcode::I32TruncF32S => {
                    let bits = self.pop(pc)? as u32;
                    let value = f32::from_bits(bits) as i32;
                    self.push(pc, value as i64)?;
                }
                Opcode::I32TruncF64S => {
                    let bits = self.pop(pc)? as u64;
                    let value = f64::from_bits(bits) as i32;
                    self.push(pc, value as i64)?;
                }
            }
        }
    }

    // === Stack primitives ===

    fn push(&mut self, pc: usize, value: i64) -> Result<(), VmError> {
        if self.stack.len() >= STACK_CAPACITY {
            return Err(VmError::new(
                pc,
                VmErrorKind::StackOverflow,
                "operand stack overflow",
            ));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, pc: usize) -> Result<i64, VmError> {
        self.stack.pop().ok_or_else(|| {
            VmError::new(pc, VmErrorKind::StackUnderflow, "operand stack underflow")
        })
    }

    fn pop_address(&mut self, pc: usize) -> Result<u64, VmError> {
        let address = self.pop(pc)? as u64;
        if address == 0 {
            return Err(VmError::new(
                pc,
                VmErrorKind::NullPointer,
                "null address in memory operation",
            ));
        }
        Ok(address)
    }

    fn index_operand(&self, pc: usize, operand: Operand) -> Result<u32, VmError> {
        operand.as_index().ok_or_else(|| {
            VmError::new(
                pc,
                VmErrorKind::UnknownOpcode,
                "instruction is missing its index operand",
            )
        })
    }

    /// Absolute locals index for the current frame, growing the root frame
    /// on demand (hand-built programs have no `func` marker).
    fn local_slot(&mut self, pc: usize, operand: Operand) -> Result<usize, VmError> {
        let slot = self.index_operand(pc, operand)? as usize;
        let base = self.frames.last().map(|f| f.locals_base).unwrap_or(0);
        let index = base + slot;
        if index >= self.locals.len() {
            if self.frames.is_empty() {
                self.locals.resize(index + 1, 0);
            } else {
                return Err(VmError::new(
                    pc,
                    VmErrorKind::UnknownSymbol,
                    format!("local slot {} out of range", slot),
                ));
            }
        }
        Ok(index)
    }

    // === Control flow ===

    fn branch(&mut self, pc: usize, depth: u32) -> Result<(), VmError> {
        let control_base = self.frames.last().map(|f| f.control_base).unwrap_or(0);
        let available = self.control.len().saturating_sub(control_base);
        if depth as usize >= available {
            return Err(VmError::new(
                pc,
                VmErrorKind::MalformedControl,
                format!("branch depth {} exceeds open block count", depth),
            ));
        }
        let target_index = self.control.len() - 1 - depth as usize;
        let target = self.control[target_index];
        match target.kind {
            ControlKind::Loop => {
                // Branching to a loop re-enters it at the head; the frame
                // stays, everything nested inside it unwinds.
                self.control.truncate(target_index + 1);
                self.pc = target.head_pc + 1;
            }
            ControlKind::Block | ControlKind::If => {
                self.control.truncate(target_index);
                self.pc = target.end_pc + 1;
            }
            ControlKind::Func => {
                return Err(VmError::new(
                    pc,
                    VmErrorKind::MalformedControl,
                    "branch target crosses a function boundary",
                ));
            }
        }
        Ok(())
    }

    /// Pop the current call frame. Returns `Some(result)` when the outermost
    /// frame returned and the machine should stop.
    fn do_return(&mut self, value: i64) -> Result<Option<i64>, VmError> {
        match self.frames.pop() {
            None => Ok(Some(value)),
            Some(frame) => {
                self.locals.truncate(frame.locals_base);
                self.control.truncate(frame.control_base);
                if frame.return_pc == usize::MAX {
                    // Root frame: the program result is this return value.
                    return Ok(Some(value));
                }
                self.pc = frame.return_pc;
                self.stack.push(value);
                Ok(None)
            }
        }
    }

    fn do_call(&mut self, pc: usize, symbol: u32, argc: usize) -> Result<(), VmError> {
        let entry = self.program.symbols.by_index(symbol).ok_or_else(|| {
            VmError::new(
                pc,
                VmErrorKind::UnknownSymbol,
                format!("call references unknown symbol index {}", symbol),
            )
        })?;

        match entry.kind {
            SymbolKind::Host => {
                let ffi_entry = self.ffi.entry(&entry.name).ok_or_else(|| {
                    VmError::new(
                        pc,
                        VmErrorKind::HostCall,
                        format!("host function '{}' is not registered", entry.name),
                    )
                })?;

                let mut args = vec![0i64; argc];
                for slot in args.iter_mut().rev() {
                    *slot = self.pop(pc)?;
                }

                let result = self.ffi.call_entry(ffi_entry, &args).map_err(|e| {
                    VmError::new(pc, VmErrorKind::HostCall, e.to_string())
                })?;
                self.push(pc, result)?;
                Ok(())
            }
            SymbolKind::Function => {
                let function = self.program.function_by_symbol(symbol).ok_or_else(|| {
                    VmError::new(
                        pc,
                        VmErrorKind::UnknownSymbol,
                        format!("function '{}' has no body", entry.name),
                    )
                })?;
                let function = function.clone();

                let locals_base = self.locals.len();
                self.frames.push(CallFrame {
                    return_pc: self.pc,
                    locals_base,
                    control_base: self.control.len(),
                });
                self.locals
                    .resize(locals_base + function.local_count as usize, 0);

                // Arguments were pushed left to right; pop them into the
                // parameter slots in reverse. Surplus arguments are
                // discarded, missing ones stay zero.
                let params = function.param_count as usize;
                for _ in params..argc {
                    self.pop(pc)?;
                }
                for i in (0..params.min(argc)).rev() {
                    let value = self.pop(pc)?;
                    self.locals[locals_base + i] = value;
                }

                // The func marker itself only runs for the entry function;
                // calls land on the first body instruction. The callee's
                // control frame still needs to exist so its `end` returns.
                let info = find_func_end(self.program, function.entry_pc).ok_or_else(|| {
                    VmError::new(
                        pc,
                        VmErrorKind::MalformedControl,
                        "function body has no matching end",
                    )
                })?;
                self.control.push(ControlFrame {
                    kind: ControlKind::Func,
                    head_pc: function.entry_pc,
                    end_pc: info,
                });

                self.pc = function.entry_pc + 1;
                Ok(())
            }
            SymbolKind::Local => Err(VmError::new(
                pc,
                VmErrorKind::UnknownSymbol,
                format!("call target '{}' is not a function", entry.name),
            )),
        }
    }
}

/// i32 arithmetic, logic and comparison semantics.
fn binary_i32(pc: usize, opcode: Opcode, lhs: i32, rhs: i32) -> Result<i32, VmError> {
    let div_zero = || VmError::new(pc, VmErrorKind::DivisionByZero, "division by zero");
    Ok(match opcode {
        Opcode::I32DivS => {
            if rhs == 0 {
                return Err(div_zero());
            }
            lhs.wrapping_div(rhs)
        }
        Opcode::I32DivU => {
            if rhs == 0 {
                return Err(div_zero());
            }
            ((lhs as u32) / (rhs as u32)) as i32
        }
        Opcode::I32RemS => {
            if rhs == 0 {
                return Err(div_zero());
            }
            lhs.wrapping_rem(rhs)
        }
        Opcode::I32RemU => {
            if rhs == 0 {
                return Err(div_zero());
            }
            ((lhs as u32) % (rhs as u32)) as i32
        }
        Opcode::I32And => lhs & rhs,
        Opcode::I32Or => lhs | rhs,
        Opcode::I32Xor => lhs ^ rhs,
        Opcode::I32Shl => lhs.wrapping_shl(rhs as u32),
        Opcode::I32ShrS => lhs.wrapping_shr(rhs as u32),
        Opcode::I32ShrU => ((lhs as u32).wrapping_shr(rhs as u32)) as i32,
        Opcode::I32Eq => (lhs == rhs) as i32,
        Opcode::I32Ne => (lhs != rhs) as i32,
        Opcode::I32LtS => (lhs < rhs) as i32,
        Opcode::I32LtU => ((lhs as u32) < (rhs as u32)) as i32,
        Opcode::I32GtS => (lhs > rhs) as i32,
        Opcode::I32GtU => ((lhs as u32) > (rhs as u32)) as i32,
        Opcode::I32LeS => (lhs <= rhs) as i32,
        Opcode::I32LeU => ((lhs as u32) <= (rhs as u32)) as i32,
        Opcode::I32GeS => (lhs >= rhs) as i32,
        Opcode::I32GeU => ((lhs as u32) >= (rhs as u32)) as i32,
        other => {
            return Err(VmError::new(
                pc,
                VmErrorKind::UnknownOpcode,
                format!("'{}' is not a binary i32 opcode", other),
            ));
        }
    })
}

/// Match every structured-control opener with its `else`/`end` in one scan.
fn build_jump_map(program: &AstcProgram) -> Result<HashMap<usize, JumpInfo>, VmError> {
    let mut map = HashMap::new();
    let mut stack: Vec<(usize, Option<usize>)> = Vec::new();

    for (pc, inst) in program.instructions.iter().enumerate() {
        match inst.opcode {
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Func => {
                stack.push((pc, None));
            }
            Opcode::Else => {
                let top = stack.last_mut().ok_or_else(|| {
                    VmError::new(pc, VmErrorKind::MalformedControl, "else without open if")
                })?;
                top.1 = Some(pc);
            }
            Opcode::End => {
                let (open_pc, else_pc) = stack.pop().ok_or_else(|| {
                    VmError::new(pc, VmErrorKind::MalformedControl, "end without open block")
                })?;
                map.insert(
                    open_pc,
                    JumpInfo {
                        else_pc,
                        end_pc: pc,
                    },
                );
            }
            _ => {}
        }
    }

    if let Some((open_pc, _)) = stack.pop() {
        return Err(VmError::new(
            open_pc,
            VmErrorKind::MalformedControl,
            "unmatched block/loop/if/func",
        ));
    }

    Ok(map)
}

/// `end_pc` of the function whose `func` marker sits at `entry_pc`.
fn find_func_end(program: &AstcProgram, entry_pc: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (pc, inst) in program.instructions.iter().enumerate().skip(entry_pc) {
        match inst.opcode {
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Func => depth += 1,
            Opcode::End => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(pc);
                }
            }
            _ => {}
        }
    }
    None
}
