//! Executable-memory arena for JIT output.
//!
//! A single page-aligned `mmap` region, writable and executable for its
//! whole lifetime, with a bump cursor. Published code pointers never move;
//! the cursor only grows (cache eviction does not reclaim arena bytes).
//! The arena is owned by exactly one JIT context and must not be shared
//! across threads.

use super::JitError;

/// Default arena capacity.
pub const DEFAULT_ARENA_SIZE: usize = 1 << 20;

pub struct ExecutableMemory {
    ptr: *mut u8,
    size: usize,
    used: usize,
}

impl ExecutableMemory {
    #[cfg(unix)]
    pub fn new(size: usize) -> Result<Self, JitError> {
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(JitError::arena("mmap of executable arena failed"));
        }
        Ok(Self {
            ptr: ptr as *mut u8,
            size,
            used: 0,
        })
    }

    #[cfg(not(unix))]
    pub fn new(_size: usize) -> Result<Self, JitError> {
        Err(JitError::unsupported(
            "executable arenas require a Unix host",
        ))
    }

    /// Copy `code` into the arena at the cursor and return its address.
    pub fn install(&mut self, code: &[u8]) -> Result<*const u8, JitError> {
        // 16-byte alignment keeps entry points friendly to every target.
        let start = (self.used + 15) & !15;
        if start + code.len() > self.size {
            return Err(JitError::arena(format!(
                "arena exhausted: {} used of {} bytes, {} requested",
                self.used,
                self.size,
                code.len()
            )));
        }
        let dst = unsafe { self.ptr.add(start) };
        unsafe {
            std::ptr::copy_nonoverlapping(code.as_ptr(), dst, code.len());
        }
        self.used = start + code.len();
        Ok(dst as *const u8)
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.size
    }
}

impl Drop for ExecutableMemory {
    fn drop(&mut self) {
        #[cfg(unix)]
        if !self.ptr.is_null() {
            unsafe {
                libc::munmap(self.ptr as *mut libc::c_void, self.size);
            }
        }
    }
}
