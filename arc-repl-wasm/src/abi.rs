//! wasm-bindgen glue exports and the primitive operations built on them.
//!
//! wasm-bindgen has shipped two shapes of this glue over time:
//!
//! | concern        | legacy                         | current                                   |
//! |----------------|--------------------------------|-------------------------------------------|
//! | shadow stack   | mutable global `__wbindgen_export_0` | `__wbindgen_add_to_stack_pointer(i32) -> i32` |
//! | allocation     | `__wbindgen_malloc(size)`      | `__wbindgen_malloc(size, align)`          |
//! | deallocation   | `__wbindgen_free(ptr, len)`    | `__wbindgen_free(ptr, len, align)`        |
//!
//! Each concern is resolved independently, so mixed modules work too.

use wasmi::{Func, Global, Instance, Memory, Store, TypedFunc, Val};

use crate::error::HostError;

pub const MEMORY: &str = "memory";
pub const MALLOC: &str = "__wbindgen_malloc";
pub const FREE: &str = "__wbindgen_free";
pub const STACK_POINTER_GLOBAL: &str = "__wbindgen_export_0";
pub const ADD_TO_STACK_POINTER: &str = "__wbindgen_add_to_stack_pointer";
pub const START: &str = "__wbindgen_start";

/// Size of the return area reserved on the shadow stack for one call.
pub const RETURN_AREA: i32 = 16;

/// Alignment passed to the allocator for UTF-8 buffers.
const BYTE_ALIGN: i32 = 1;

pub enum StackPointer {
    Global(Global),
    Adjust(TypedFunc<i32, i32>),
}

pub enum Allocator {
    Sized(TypedFunc<i32, i32>),
    Aligned(TypedFunc<(i32, i32), i32>),
}

pub enum Deallocator {
    Sized(TypedFunc<(i32, i32), ()>),
    Aligned(TypedFunc<(i32, i32, i32), ()>),
}

/// The exports one compile call needs, resolved from a live instance.
pub struct BindgenExports {
    pub memory: Memory,
    pub entry: TypedFunc<(i32, i32, i32), ()>,
    pub stack: StackPointer,
    pub malloc: Allocator,
    pub free: Deallocator,
}

impl BindgenExports {
    pub fn resolve(store: &Store<()>, instance: &Instance, entry: &str) -> Result<Self, HostError> {
        let memory = instance
            .get_memory(store, MEMORY)
            .ok_or_else(|| missing("memory", MEMORY))?;

        let entry_func = func(store, instance, entry)?;
        let entry = entry_func
            .typed::<(i32, i32, i32), ()>(store)
            .map_err(|_| signature(entry))?;

        let stack = if let Some(global) = instance.get_global(store, STACK_POINTER_GLOBAL) {
            StackPointer::Global(global)
        } else if let Some(adjust) = instance.get_func(store, ADD_TO_STACK_POINTER) {
            StackPointer::Adjust(
                adjust
                    .typed::<i32, i32>(store)
                    .map_err(|_| signature(ADD_TO_STACK_POINTER))?,
            )
        } else {
            return Err(missing("stack pointer", STACK_POINTER_GLOBAL));
        };

        let malloc_func = func(store, instance, MALLOC)?;
        let malloc = if let Ok(typed) = malloc_func.typed::<(i32, i32), i32>(store) {
            Allocator::Aligned(typed)
        } else {
            Allocator::Sized(
                malloc_func
                    .typed::<i32, i32>(store)
                    .map_err(|_| signature(MALLOC))?,
            )
        };

        let free_func = func(store, instance, FREE)?;
        let free = if let Ok(typed) = free_func.typed::<(i32, i32, i32), ()>(store) {
            Deallocator::Aligned(typed)
        } else {
            Deallocator::Sized(
                free_func
                    .typed::<(i32, i32), ()>(store)
                    .map_err(|_| signature(FREE))?,
            )
        };

        Ok(Self {
            memory,
            entry,
            stack,
            malloc,
            free,
        })
    }

    /// Move the shadow stack pointer by `delta` and return the new value.
    pub fn adjust_stack(&self, store: &mut Store<()>, delta: i32) -> Result<i32, HostError> {
        match &self.stack {
            StackPointer::Global(global) => {
                let current = match global.get(&*store) {
                    Val::I32(value) => value,
                    other => {
                        return Err(HostError::StackPointer(format!(
                            "expected an i32 global, found {other:?}"
                        )));
                    }
                };
                let updated = current.wrapping_add(delta);
                global
                    .set(&mut *store, Val::I32(updated))
                    .map_err(|err| HostError::StackPointer(err.to_string()))?;
                Ok(updated)
            }
            StackPointer::Adjust(adjust) => adjust.call(store, delta).map_err(trap),
        }
    }

    pub fn malloc(&self, store: &mut Store<()>, size: i32) -> Result<i32, HostError> {
        match &self.malloc {
            Allocator::Sized(malloc) => malloc.call(store, size),
            Allocator::Aligned(malloc) => malloc.call(store, (size, BYTE_ALIGN)),
        }
        .map_err(trap)
    }

    pub fn free(&self, store: &mut Store<()>, ptr: i32, len: i32) -> Result<(), HostError> {
        match &self.free {
            Deallocator::Sized(free) => free.call(store, (ptr, len)),
            Deallocator::Aligned(free) => free.call(store, (ptr, len, BYTE_ALIGN)),
        }
        .map_err(trap)
    }

    pub fn write_bytes(&self, store: &mut Store<()>, ptr: i32, bytes: &[u8]) -> Result<(), HostError> {
        self.memory
            .write(store, address(ptr), bytes)
            .map_err(|err| HostError::Memory(err.to_string()))
    }

    /// Copy `len` bytes out of linear memory. The range is checked against
    /// the memory size before anything is allocated.
    pub fn read_bytes(&self, store: &Store<()>, ptr: i32, len: i32) -> Result<Vec<u8>, HostError> {
        let len = usize::try_from(len)
            .map_err(|_| HostError::Memory(format!("negative length {len}")))?;
        let start = address(ptr);
        let data = self.memory.data(store);
        start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                HostError::Memory(format!(
                    "{len} bytes at {start:#x} exceed memory of {} bytes",
                    data.len()
                ))
            })
    }

    pub fn read_i32(&self, store: &Store<()>, ptr: i32) -> Result<i32, HostError> {
        let mut word = [0u8; 4];
        self.memory
            .read(store, address(ptr), &mut word)
            .map_err(|err| HostError::Memory(err.to_string()))?;
        Ok(i32::from_le_bytes(word))
    }
}

/// Call `__wbindgen_start` if the module exports one.
pub fn run_start(store: &mut Store<()>, instance: &Instance) -> Result<(), HostError> {
    let Some(start) = instance.get_func(&*store, START) else {
        return Ok(());
    };
    let start = start
        .typed::<(), ()>(&*store)
        .map_err(|_| signature(START))?;
    start.call(store, ()).map_err(trap)
}

/// wasm32 pointers are unsigned.
fn address(ptr: i32) -> usize {
    ptr as u32 as usize
}

fn func(store: &Store<()>, instance: &Instance, name: &str) -> Result<Func, HostError> {
    instance
        .get_func(store, name)
        .ok_or_else(|| missing("function", name))
}

fn missing(kind: &'static str, name: &str) -> HostError {
    HostError::MissingExport {
        kind,
        name: name.to_string(),
    }
}

fn signature(name: &str) -> HostError {
    HostError::Signature {
        name: name.to_string(),
    }
}

pub(crate) fn trap(err: wasmi::Error) -> HostError {
    HostError::Trap(err.to_string())
}
