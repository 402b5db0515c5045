//! # FFI Registry
//!
//! Named host-function table with typed trampoline dispatch.
//!
//! ## Model
//!
//! The registry is an append-only vector of entries `(name, return kind,
//! parameter kinds, code pointer, variadic flag)`. Calls dispatch by
//! argument count through a small set of hand-written trampolines (0 to 3
//! arguments); anything wider is rejected rather than miscalled. Arguments
//! and results travel as 64-bit cells, matching the VM's stack; integer
//! results are masked down to the registered return kind.
//!
//! Variadic entries (`printf`) go through a C-variadic function-pointer
//! type so the platform calling convention is set up correctly; only
//! integer/pointer variadic arguments are supported.
//!
//! ## Baseline
//!
//! Six host functions are pre-registered: `printf`, `malloc`, `free`,
//! `strlen`, `memcpy`, `exit`.
//!
//! ## Dynamic libraries
//!
//! `load_library` opens a shared object with `dlopen` (at most 16
//! concurrently); `resolve` searches every open handle with `dlsym`.
//! Handles close on drop.


/// Names the parser flags as host-library calls and the registry
/// pre-registers at construction.
pub const BASELINE_HOST_FUNCTIONS: [&str; 6] =
    ["printf", "malloc", "free", "strlen", "memcpy", "exit"];

/// Maximum number of concurrently loaded dynamic libraries.
pub const MAX_LIBRARIES: usize = 16;

/// Value kinds crossing the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Void,
    I32,
    I64,
    F32,
    F64,
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FfiError {
    pub name: String,
    pub kind: FfiErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorKind {
    UnknownSymbol,
    UnsupportedArity,
    UnsupportedReturn,
    ArgumentMismatch,
    LibraryLimit,
    LibraryOpen,
}

impl FfiError {
    fn new(name: &str, kind: FfiErrorKind, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FfiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FFI error for '{}': {}", self.name, self.message)
    }
}

impl std::error::Error for FfiError {}

/// One registered host function.
pub struct FfiEntry {
    pub name: String,
    pub return_kind: ValueKind,
    pub params: Vec<ValueKind>,
    pub variadic: bool,
    code: *const (),
}

impl FfiEntry {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A dynamic library handle owned by the registry.
#[cfg(unix)]
struct Library {
    handle: *mut libc::c_void,
    path: String,
}

#[cfg(unix)]
impl Drop for Library {
    fn drop(&mut self) {
        // The registry owns the handle exclusively.
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

#[derive(Default)]
pub struct FfiRegistry {
    entries: Vec<FfiEntry>,
    #[cfg(unix)]
    libraries: Vec<Library>,
}

impl FfiRegistry {
    /// An empty registry with no host functions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the six baseline host functions pre-registered.
    pub fn with_baseline() -> Self {
        use ValueKind::*;

        let mut registry = Self::new();

        let printf =
            libc::printf as unsafe extern "C" fn(*const libc::c_char, ...) -> libc::c_int;
        registry.register("printf", I32, vec![Pointer], printf as *const (), true);

        let malloc = libc::malloc as unsafe extern "C" fn(libc::size_t) -> *mut libc::c_void;
        registry.register("malloc", Pointer, vec![I64], malloc as *const (), false);

        let free = libc::free as unsafe extern "C" fn(*mut libc::c_void);
        registry.register("free", Void, vec![Pointer], free as *const (), false);

        let strlen = libc::strlen as unsafe extern "C" fn(*const libc::c_char) -> libc::size_t;
        registry.register("strlen", I64, vec![Pointer], strlen as *const (), false);

        let memcpy = libc::memcpy
            as unsafe extern "C" fn(
                *mut libc::c_void,
                *const libc::c_void,
                libc::size_t,
            ) -> *mut libc::c_void;
        registry.register(
            "memcpy",
            Pointer,
            vec![Pointer, Pointer, I64],
            memcpy as *const (),
            false,
        );

        let exit = libc::exit as unsafe extern "C" fn(libc::c_int) -> !;
        registry.register("exit", Void, vec![I32], exit as *const (), false);

        registry
    }

    /// Append an entry and return its index. Append-only: re-registering a
    /// name adds a new entry; lookups by name find the first registration.
    pub fn register(
        &mut self,
        name: &str,
        return_kind: ValueKind,
        params: Vec<ValueKind>,
        code: *const (),
        variadic: bool,
    ) -> u32 {
        let index = self.entries.len() as u32;
        self.entries.push(FfiEntry {
            name: name.to_string(),
            return_kind,
            params,
            variadic,
            code,
        });
        index
    }

    pub fn entry(&self, name: &str) -> Option<&FfiEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entry_at(&self, index: u32) -> Option<&FfiEntry> {
        self.entries.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call a registered function by name with cell-packed arguments.
    pub fn call(&self, name: &str, args: &[i64]) -> Result<i64, FfiError> {
        let entry = self.entry(name).ok_or_else(|| {
            FfiError::new(
                name,
                FfiErrorKind::UnknownSymbol,
                "symbol not found in FFI registry",
            )
        })?;
        self.call_entry(entry, args)
    }

    /// Call through a specific entry with cell-packed arguments.
    pub fn call_entry(&self, entry: &FfiEntry, args: &[i64]) -> Result<i64, FfiError> {
        if entry.variadic {
            if args.len() < entry.arity() {
                return Err(FfiError::new(
                    &entry.name,
                    FfiErrorKind::ArgumentMismatch,
                    format!(
                        "expected at least {} arguments, got {}",
                        entry.arity(),
                        args.len()
                    ),
                ));
            }
        } else if args.len() != entry.arity() {
            return Err(FfiError::new(
                &entry.name,
                FfiErrorKind::ArgumentMismatch,
                format!("expected {} arguments, got {}", entry.arity(), args.len()),
            ));
        }

        if matches!(entry.return_kind, ValueKind::F32 | ValueKind::F64) {
            return Err(FfiError::new(
                &entry.name,
                FfiErrorKind::UnsupportedReturn,
                "float returns are outside the trampoline set",
            ));
        }

        let raw = if entry.variadic {
            self.dispatch_variadic(entry, args)?
        } else {
            self.dispatch_fixed(entry, args)?
        };

        Ok(match entry.return_kind {
            ValueKind::Void => 0,
            ValueKind::I32 => (raw as i32) as i64,
            _ => raw,
        })
    }

    fn dispatch_fixed(&self, entry: &FfiEntry, args: &[i64]) -> Result<i64, FfiError> {
        let code = entry.code;
        // Each arm transmutes the stored code pointer to the exact arity it
        // was registered with; the cell representation makes every integer
        // and pointer argument the same width.
        unsafe {
            match args.len() {
                0 => {
                    let f: unsafe extern "C" fn() -> i64 = std::mem::transmute(code);
                    Ok(f())
                }
                1 => {
                    let f: unsafe extern "C" fn(i64) -> i64 = std::mem::transmute(code);
                    Ok(f(args[0]))
                }
                2 => {
                    let f: unsafe extern "C" fn(i64, i64) -> i64 = std::mem::transmute(code);
                    Ok(f(args[0], args[1]))
                }
                3 => {
                    let f: unsafe extern "C" fn(i64, i64, i64) -> i64 = std::mem::transmute(code);
                    Ok(f(args[0], args[1], args[2]))
                }
                n => Err(FfiError::new(
                    &entry.name,
                    FfiErrorKind::UnsupportedArity,
                    format!("no trampoline for {}-argument calls", n),
                )),
            }
        }
    }

    fn dispatch_variadic(&self, entry: &FfiEntry, args: &[i64]) -> Result<i64, FfiError> {
        let code = entry.code;
        // The variadic fn-pointer type makes the compiler emit the proper
        // varargs call sequence (e.g. %al = 0 vector registers on x86-64).
        unsafe {
            let f: unsafe extern "C" fn(i64, ...) -> i64 = std::mem::transmute(code);
            match args.len() {
                1 => Ok(f(args[0])),
                2 => Ok(f(args[0], args[1])),
                3 => Ok(f(args[0], args[1], args[2])),
                n => Err(FfiError::new(
                    &entry.name,
                    FfiErrorKind::UnsupportedArity,
                    format!("no variadic trampoline for {}-argument calls", n),
                )),
            }
        }
    }

    /// Open a dynamic library and keep its handle for symbol resolution.
    #[cfg(unix)]
    pub fn load_library(&mut self, path: &str) -> Result<(), FfiError> {
        if self.libraries.len() >= MAX_LIBRARIES {
            return Err(FfiError::new(
                path,
                FfiErrorKind::LibraryLimit,
                format!("library limit of {} reached", MAX_LIBRARIES),
            ));
        }
        let c_path = std::ffi::CString::new(path).map_err(|_| {
            FfiError::new(path, FfiErrorKind::LibraryOpen, "path contains NUL byte")
        })?;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW) };
        if handle.is_null() {
            return Err(FfiError::new(
                path,
                FfiErrorKind::LibraryOpen,
                "dlopen failed",
            ));
        }
        self.libraries.push(Library {
            handle,
            path: path.to_string(),
        });
        Ok(())
    }

    /// Resolve a symbol from any loaded library.
    #[cfg(unix)]
    pub fn resolve(&self, name: &str) -> Option<*const ()> {
        let c_name = std::ffi::CString::new(name).ok()?;
        for library in &self.libraries {
            let sym = unsafe { libc::dlsym(library.handle, c_name.as_ptr()) };
            if !sym.is_null() {
                return Some(sym as *const ());
            }
        }
        None
    }

    #[cfg(unix)]
    pub fn loaded_libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.iter().map(|l| l.path.as_str())
    }
}
