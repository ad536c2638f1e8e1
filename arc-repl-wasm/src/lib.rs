//! Hosts a wasm-bindgen compiled compiler module and exposes it as a
//! [`CompileService`](arc_repl_core::CompileService).
//!
//! The module is expected to export a single `compile(source) -> string`
//! entry point in wasm-bindgen's calling convention, plus the usual glue
//! exports (`memory`, `__wbindgen_malloc`, `__wbindgen_free` and a shadow
//! stack pointer). Both the older global-based stack pointer and the newer
//! `__wbindgen_add_to_stack_pointer` function are understood.

pub mod abi;
pub mod error;
pub mod host;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::HostError;
pub use host::{HostOptions, WasmCompiler};
