//! Small wasm-bindgen shaped compiler modules for tests.
//!
//! The generated module has one page of memory laid out as
//!
//! - `[0, STACK_TOP)`: shadow stack, growing down from `STACK_TOP`
//! - `[DATA_OFFSET, HEAP_BASE)`: constant reply text
//! - `[HEAP_BASE, ..)`: bump allocator, never reclaimed
//!
//! and exports `alloc_count`, `free_count` and `__stack_pointer` globals
//! so tests can check the host's bookkeeping.

use std::io;
use std::path::Path;

use wasm_encoder::{
    BlockType, CodeSection, ConstExpr, DataSection, ExportKind, ExportSection, Function,
    FunctionSection, GlobalSection, GlobalType, Instruction, MemArg, MemorySection, MemoryType,
    Module, TypeSection, ValType,
};

use crate::abi::{ADD_TO_STACK_POINTER, FREE, MALLOC, MEMORY, STACK_POINTER_GLOBAL, START};

pub const STACK_TOP: i32 = 1024;
pub const DATA_OFFSET: i32 = 1024;
pub const HEAP_BASE: i32 = 4096;

pub const ALLOC_COUNT: &str = "alloc_count";
pub const FREE_COUNT: &str = "free_count";
pub const STACK_POINTER: &str = "__stack_pointer";

// Global indices.
const SP: u32 = 0;
const HEAP: u32 = 1;
const ALLOCS: u32 = 2;
const FREES: u32 = 3;
const STARTED: u32 = 4;

// Function indices.
const MALLOC_FN: u32 = 0;
const FREE_FN: u32 = 1;
const ENTRY_FN: u32 = 2;
const ADJUST_FN: u32 = 3;
const START_FN: u32 = 4;

/// Which generation of wasm-bindgen glue to imitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abi {
    /// Global stack pointer, `malloc(size)`, `free(ptr, len)`.
    Legacy,
    /// `__wbindgen_add_to_stack_pointer`, aligned allocator and
    /// `__wbindgen_start`. The entry point traps if start was not run.
    Modern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    /// Hand the input buffer back as the result.
    Echo,
    /// Always return these bytes, which need not be UTF-8.
    Constant(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct FixtureCompiler {
    abi: Abi,
    reply: Reply,
    trap_on: Option<u8>,
    entry: String,
}

impl FixtureCompiler {
    pub fn echo() -> Self {
        Self {
            abi: Abi::Legacy,
            reply: Reply::Echo,
            trap_on: None,
            entry: "compile".to_string(),
        }
    }

    pub fn constant(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Constant(text.into().into_bytes()),
            ..Self::echo()
        }
    }

    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: Reply::Constant(bytes.into()),
            ..Self::echo()
        }
    }

    pub fn abi(mut self, abi: Abi) -> Self {
        self.abi = abi;
        self
    }

    /// Trap with `unreachable` when the input starts with `byte`.
    pub fn trap_on(mut self, byte: u8) -> Self {
        self.trap_on = Some(byte);
        self
    }

    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = name.into();
        self
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }

    pub fn build(&self) -> Vec<u8> {
        let modern = self.abi == Abi::Modern;
        let mut module = Module::new();

        let mut types = TypeSection::new();
        let unary = types.len();
        types.ty().function([ValType::I32], [ValType::I32]);
        let binary = types.len();
        types.ty().function([ValType::I32, ValType::I32], [ValType::I32]);
        let pair_sink = types.len();
        types.ty().function([ValType::I32, ValType::I32], []);
        let triple_sink = types.len();
        types
            .ty()
            .function([ValType::I32, ValType::I32, ValType::I32], []);
        let nullary = types.len();
        types.ty().function([], []);
        module.section(&types);

        let mut functions = FunctionSection::new();
        functions.function(if modern { binary } else { unary });
        functions.function(if modern { triple_sink } else { pair_sink });
        functions.function(triple_sink);
        if modern {
            functions.function(unary);
            functions.function(nullary);
        }
        module.section(&functions);

        let mut memories = MemorySection::new();
        memories.memory(MemoryType {
            minimum: 1,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        module.section(&memories);

        let mut globals = GlobalSection::new();
        for initial in [STACK_TOP, HEAP_BASE, 0, 0, if modern { 0 } else { 1 }] {
            globals.global(
                GlobalType {
                    val_type: ValType::I32,
                    mutable: true,
                    shared: false,
                },
                &ConstExpr::i32_const(initial),
            );
        }
        module.section(&globals);

        let mut exports = ExportSection::new();
        exports.export(MEMORY, ExportKind::Memory, 0);
        exports.export(MALLOC, ExportKind::Func, MALLOC_FN);
        exports.export(FREE, ExportKind::Func, FREE_FN);
        exports.export(&self.entry, ExportKind::Func, ENTRY_FN);
        exports.export(STACK_POINTER, ExportKind::Global, SP);
        exports.export(ALLOC_COUNT, ExportKind::Global, ALLOCS);
        exports.export(FREE_COUNT, ExportKind::Global, FREES);
        if modern {
            exports.export(ADD_TO_STACK_POINTER, ExportKind::Func, ADJUST_FN);
            exports.export(START, ExportKind::Func, START_FN);
        } else {
            exports.export(STACK_POINTER_GLOBAL, ExportKind::Global, SP);
        }
        module.section(&exports);

        let mut code = CodeSection::new();
        code.function(&malloc_body());
        code.function(&free_body());
        code.function(&self.entry_body());
        if modern {
            code.function(&adjust_body());
            code.function(&start_body());
        }
        module.section(&code);

        if let Reply::Constant(bytes) = &self.reply {
            assert!(
                bytes.len() <= (HEAP_BASE - DATA_OFFSET) as usize,
                "constant reply does not fit the data region"
            );
            let mut data = DataSection::new();
            data.active(
                0,
                &ConstExpr::i32_const(DATA_OFFSET),
                bytes.iter().copied(),
            );
            module.section(&data);
        }

        module.finish()
    }

    /// `compile(retptr, ptr, len)`
    fn entry_body(&self) -> Function {
        let mut func = Function::new(vec![]);

        if self.abi == Abi::Modern {
            func.instruction(&Instruction::GlobalGet(STARTED));
            func.instruction(&Instruction::I32Eqz);
            func.instruction(&Instruction::If(BlockType::Empty));
            func.instruction(&Instruction::Unreachable);
            func.instruction(&Instruction::End);
        }

        if let Some(byte) = self.trap_on {
            func.instruction(&Instruction::LocalGet(2));
            func.instruction(&Instruction::If(BlockType::Empty));
            func.instruction(&Instruction::LocalGet(1));
            func.instruction(&Instruction::I32Load8U(mem_arg(0, 0)));
            func.instruction(&Instruction::I32Const(i32::from(byte)));
            func.instruction(&Instruction::I32Eq);
            func.instruction(&Instruction::If(BlockType::Empty));
            func.instruction(&Instruction::Unreachable);
            func.instruction(&Instruction::End);
            func.instruction(&Instruction::End);
        }

        let (out_ptr, out_len) = match &self.reply {
            Reply::Echo => (Instruction::LocalGet(1), Instruction::LocalGet(2)),
            Reply::Constant(bytes) => (
                Instruction::I32Const(DATA_OFFSET),
                Instruction::I32Const(bytes.len() as i32),
            ),
        };
        func.instruction(&Instruction::LocalGet(0));
        func.instruction(&out_ptr);
        func.instruction(&Instruction::I32Store(mem_arg(0, 2)));
        func.instruction(&Instruction::LocalGet(0));
        func.instruction(&out_len);
        func.instruction(&Instruction::I32Store(mem_arg(4, 2)));
        func.instruction(&Instruction::End);
        func
    }
}

/// Bump allocator: returns the current heap pointer and advances it.
fn malloc_body() -> Function {
    let mut func = Function::new(vec![]);
    func.instruction(&Instruction::GlobalGet(HEAP));
    func.instruction(&Instruction::GlobalGet(HEAP));
    func.instruction(&Instruction::LocalGet(0));
    func.instruction(&Instruction::I32Add);
    func.instruction(&Instruction::GlobalSet(HEAP));
    bump(&mut func, ALLOCS);
    func.instruction(&Instruction::End);
    func
}

fn free_body() -> Function {
    let mut func = Function::new(vec![]);
    bump(&mut func, FREES);
    func.instruction(&Instruction::End);
    func
}

fn adjust_body() -> Function {
    let mut func = Function::new(vec![]);
    func.instruction(&Instruction::GlobalGet(SP));
    func.instruction(&Instruction::LocalGet(0));
    func.instruction(&Instruction::I32Add);
    func.instruction(&Instruction::GlobalSet(SP));
    func.instruction(&Instruction::GlobalGet(SP));
    func.instruction(&Instruction::End);
    func
}

fn start_body() -> Function {
    let mut func = Function::new(vec![]);
    func.instruction(&Instruction::I32Const(1));
    func.instruction(&Instruction::GlobalSet(STARTED));
    func.instruction(&Instruction::End);
    func
}

fn bump(func: &mut Function, global: u32) {
    func.instruction(&Instruction::GlobalGet(global));
    func.instruction(&Instruction::I32Const(1));
    func.instruction(&Instruction::I32Add);
    func.instruction(&Instruction::GlobalSet(global));
}

fn mem_arg(offset: u64, align: u32) -> MemArg {
    MemArg {
        offset,
        align,
        memory_index: 0,
    }
}
