use std::fs;
use std::path::Path;

use arc_repl_core::{CompileFailure, CompileService};
use wasmi::{Engine, Instance, Linker, Module, Store};

use crate::abi::{self, BindgenExports, RETURN_AREA};
use crate::error::HostError;

pub const DEFAULT_ENTRY: &str = "compile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    /// Name of the exported `(source) -> string` function.
    pub entry: String,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY.to_string(),
        }
    }
}

/// One instantiation of the module together with its store.
struct Session {
    store: Store<()>,
    instance: Instance,
    exports: BindgenExports,
}

impl Session {
    fn compile(&mut self, source: &str) -> Result<String, HostError> {
        let retptr = self.exports.adjust_stack(&mut self.store, -RETURN_AREA)?;
        let called = self.call_entry(retptr, source);
        let restored = self.exports.adjust_stack(&mut self.store, RETURN_AREA);
        let (ptr, len) = called?;
        restored?;

        let decoded = self
            .exports
            .read_bytes(&self.store, ptr, len)
            .and_then(|bytes| String::from_utf8(bytes).map_err(HostError::from));
        let freed = self.exports.free(&mut self.store, ptr, len);
        let output = decoded?;
        freed?;
        Ok(output)
    }

    /// Copy `source` into the module and run the entry point. The input
    /// buffer is owned by the module once the call starts.
    fn call_entry(&mut self, retptr: i32, source: &str) -> Result<(i32, i32), HostError> {
        let len = i32::try_from(source.len())
            .map_err(|_| HostError::Memory(format!("source of {} bytes is too large", source.len())))?;
        let ptr = self.exports.malloc(&mut self.store, len)?;
        self.exports
            .write_bytes(&mut self.store, ptr, source.as_bytes())?;
        self.exports
            .entry
            .call(&mut self.store, (retptr, ptr, len))
            .map_err(abi::trap)?;

        let out_ptr = self.exports.read_i32(&self.store, retptr)?;
        let out_len = self.exports.read_i32(&self.store, retptr.wrapping_add(4))?;
        Ok((out_ptr, out_len))
    }

    fn global_i32(&self, name: &str) -> Option<i32> {
        let global = self.instance.get_global(&self.store, name)?;
        match global.get(&self.store) {
            wasmi::Val::I32(value) => Some(value),
            _ => None,
        }
    }
}

/// A compiler loaded from a wasm-bindgen module.
///
/// The instance is kept alive between calls, so module-level state
/// persists across lines the same way it did in the browser. After a trap
/// the instance is dropped and the next call starts from a fresh one.
pub struct WasmCompiler {
    engine: Engine,
    module: Module,
    options: HostOptions,
    session: Option<Session>,
    instantiations: usize,
}

impl WasmCompiler {
    pub fn from_file(path: impl AsRef<Path>, options: HostOptions) -> Result<Self, HostError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "loading compiler module");
        Self::from_bytes(&bytes, options)
    }

    /// Validate and instantiate the module. Missing exports are reported
    /// here rather than on the first compile.
    pub fn from_bytes(wasm: &[u8], options: HostOptions) -> Result<Self, HostError> {
        let engine = Engine::default();
        let module =
            Module::new(&engine, wasm).map_err(|err| HostError::InvalidModule(err.to_string()))?;
        let mut compiler = Self {
            engine,
            module,
            options,
            session: None,
            instantiations: 0,
        };
        let session = compiler.instantiate()?;
        compiler.session = Some(session);
        Ok(compiler)
    }

    /// Run the entry point on `source`.
    pub fn compile_source(&mut self, source: &str) -> Result<String, HostError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => self.instantiate()?,
        };
        let result = session.compile(source);
        match &result {
            Err(err) if err.poisons_instance() => {
                tracing::debug!(error = %err, "compiler instance discarded");
            }
            _ => self.session = Some(session),
        }
        result
    }

    /// How many times the module has been instantiated so far.
    pub fn instantiations(&self) -> usize {
        self.instantiations
    }

    fn instantiate(&mut self) -> Result<Session, HostError> {
        let mut store = Store::new(&self.engine, ());
        let linker = Linker::<()>::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, &self.module)
            .and_then(|pre| pre.start(&mut store))
            .map_err(|err| HostError::Instantiate(err.to_string()))?;
        abi::run_start(&mut store, &instance)?;
        let exports = BindgenExports::resolve(&store, &instance, &self.options.entry)?;

        self.instantiations += 1;
        tracing::debug!(count = self.instantiations, "compiler module instantiated");
        Ok(Session {
            store,
            instance,
            exports,
        })
    }

    /// Read an exported i32 global from the live instance, if there is one.
    pub fn global_i32(&self, name: &str) -> Option<i32> {
        self.session.as_ref()?.global_i32(name)
    }
}

impl CompileService for WasmCompiler {
    fn compile(&mut self, source: &str) -> Result<String, CompileFailure> {
        self.compile_source(source).map_err(CompileFailure::from)
    }
}
