//! Sandboxed wasm plugin runner.
//!
//! Plugins run in a fuel-limited wasmtime store with WASI as the only
//! host surface. The module must export `memory`, `allocate`, `deallocate`
//! and the named entry point with signature
//! `(input_ptr, input_len, output_len_ptr) -> output_ptr`.

use crate::resource::Resource;
use crate::tool::Arguments;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use wasmtime::{Config, Engine, Linker, Module, Store, TypedFunc};
use wasmtime_wasi::preview1::{self, WasiP1Ctx};
use wasmtime_wasi::WasiCtxBuilder;

/// Fuel limit per call, guarding against runaway plugins.
const FUEL: u64 = 100_000_000;

#[derive(Debug, Error)]
pub enum WasmError {
    #[error("a wasm resource is required")]
    MissingResource,

    #[error("wasm resource is not loaded")]
    ResourceNotLoaded,

    #[error("function name is not set")]
    MissingFunctionName,

    #[error("resource hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("wasm module must export {0}")]
    MissingExport(&'static str),

    #[error("wasm allocation failed")]
    Allocation,

    #[error("wasm: {0}")]
    Engine(String),
}

impl From<wasmtime::Error> for WasmError {
    fn from(e: wasmtime::Error) -> Self {
        WasmError::Engine(e.to_string())
    }
}

pub struct WasmRunner {
    engine: Engine,
    module: Module,
    funcname: String,
}

impl WasmRunner {
    /// Compile the first resource into a sandboxed module.
    ///
    /// When the resource carries a SHA-256 hash the binary is verified
    /// against it before compilation.
    pub fn new(arguments: &Arguments, resources: &[Resource]) -> Result<Self, WasmError> {
        let funcname = arguments
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(WasmError::MissingFunctionName)?
            .to_string();

        let resource = resources.first().ok_or(WasmError::MissingResource)?;
        let data = resource.data().ok_or(WasmError::ResourceNotLoaded)?;
        debug!(size = data.len(), "read wasm resource");

        if !resource.hash.is_empty() {
            let actual = hex::encode(Sha256::digest(data));
            if !actual.eq_ignore_ascii_case(&resource.hash) {
                return Err(WasmError::HashMismatch {
                    expected: resource.hash.clone(),
                    actual,
                });
            }
        }

        let mut config = Config::new();
        config.consume_fuel(true);
        let engine = Engine::new(&config)?;
        let module = Module::from_binary(&engine, data.as_ref())?;

        Ok(Self {
            engine,
            module,
            funcname,
        })
    }

    /// Call the entry point with `input`, returning the raw output bytes.
    pub fn run(&self, input: &[u8]) -> Result<Vec<u8>, WasmError> {
        let mut linker: Linker<WasiP1Ctx> = Linker::new(&self.engine);
        preview1::add_to_linker_sync(&mut linker, |ctx| ctx)?;

        let wasi = WasiCtxBuilder::new().build_p1();
        let mut store = Store::new(&self.engine, wasi);
        store.set_fuel(FUEL)?;

        let instance = linker.instantiate(&mut store, &self.module)?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or(WasmError::MissingExport("memory"))?;
        let allocate: TypedFunc<i32, i32> = instance
            .get_typed_func(&mut store, "allocate")
            .map_err(|_| WasmError::MissingExport("allocate"))?;
        let deallocate: TypedFunc<(i32, i32), ()> = instance
            .get_typed_func(&mut store, "deallocate")
            .map_err(|_| WasmError::MissingExport("deallocate"))?;
        let process: TypedFunc<(i32, i32, i32), i32> = instance
            .get_typed_func(&mut store, self.funcname.as_str())
            .map_err(|_| WasmError::MissingExport("entry function"))?;

        let input_len = input.len() as i32;
        let input_ptr = allocate.call(&mut store, input_len.max(1))?;
        if input_ptr == 0 {
            return Err(WasmError::Allocation);
        }
        memory
            .write(&mut store, input_ptr as usize, input)
            .map_err(|e| WasmError::Engine(e.to_string()))?;

        let output_len_ptr = allocate.call(&mut store, 4)?;
        if output_len_ptr == 0 {
            deallocate.call(&mut store, (input_ptr, input_len))?;
            return Err(WasmError::Allocation);
        }

        let output_ptr = process.call(&mut store, (input_ptr, input_len, output_len_ptr))?;
        deallocate.call(&mut store, (input_ptr, input_len))?;

        let mut len_bytes = [0u8; 4];
        memory
            .read(&store, output_len_ptr as usize, &mut len_bytes)
            .map_err(|e| WasmError::Engine(e.to_string()))?;
        let output_len = i32::from_le_bytes(len_bytes).max(0) as usize;
        deallocate.call(&mut store, (output_len_ptr, 4))?;

        if output_ptr == 0 {
            return Err(WasmError::Engine(format!(
                "{} returned null pointer",
                self.funcname
            )));
        }

        let mut output = vec![0u8; output_len];
        memory
            .read(&store, output_ptr as usize, &mut output)
            .map_err(|e| WasmError::Engine(e.to_string()))?;
        deallocate.call(&mut store, (output_ptr, output_len as i32))?;

        Ok(output)
    }
}
