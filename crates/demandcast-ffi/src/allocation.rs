//! Memory allocation utilities for FFI functions.
//!
//! Result arrays are allocated with `malloc` so C callers may inspect them
//! with their own tooling; they are released by the matching free functions
//! in this crate.

use crate::types::{DemandError, ErrorCode};
use core::ffi::c_char;
use std::ptr;

// Memory allocation - use libc on native, std::alloc on WASM
#[cfg(not(target_family = "wasm"))]
use libc::{free, malloc};

#[cfg(target_family = "wasm")]
unsafe fn malloc(size: usize) -> *mut core::ffi::c_void {
    use std::alloc::{alloc, Layout};
    match Layout::from_size_align(size, 8) {
        Ok(layout) => alloc(layout) as *mut core::ffi::c_void,
        Err(_) => ptr::null_mut(),
    }
}

#[cfg(target_family = "wasm")]
unsafe fn free(ptr: *mut core::ffi::c_void) {
    use std::alloc::{dealloc, Layout};
    if !ptr.is_null() {
        if let Ok(layout) = Layout::from_size_align(1, 8) {
            dealloc(ptr as *mut u8, layout);
        }
    }
}

/// Allocate and copy an array, setting error on failure.
///
/// # Safety
/// out_ptr must be a valid pointer; out_error must be valid or null.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_and_copy_array<T: Copy>(
    items: &[T],
    out_ptr: *mut *mut T,
    out_error: *mut DemandError,
) -> bool {
    if items.is_empty() {
        *out_ptr = ptr::null_mut();
        return true;
    }

    let ptr = malloc(std::mem::size_of_val(items)) as *mut T;
    if ptr.is_null() {
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    ptr::copy_nonoverlapping(items.as_ptr(), ptr, items.len());
    *out_ptr = ptr;
    true
}

/// Allocate and copy a string array.
///
/// # Safety
/// out_array must be a valid pointer; out_error must be valid or null.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_string_array<S: AsRef<str>>(
    strings: &[S],
    out_array: *mut *mut *mut c_char,
    out_error: *mut DemandError,
) -> bool {
    let n = strings.len();
    if n == 0 {
        *out_array = ptr::null_mut();
        return true;
    }

    let array_ptr = malloc(n * std::mem::size_of::<*mut c_char>()) as *mut *mut c_char;
    if array_ptr.is_null() {
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    for (i, s) in strings.iter().enumerate() {
        let s = s.as_ref();
        let str_ptr = malloc(s.len() + 1) as *mut c_char;
        if str_ptr.is_null() {
            // Clean up already allocated strings
            free_string_array(array_ptr, i);
            if !out_error.is_null() {
                (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
            }
            return false;
        }
        ptr::copy_nonoverlapping(s.as_ptr() as *const c_char, str_ptr, s.len());
        *str_ptr.add(s.len()) = 0; // Null terminator
        *array_ptr.add(i) = str_ptr;
    }

    *out_array = array_ptr;
    true
}

/// Free a string array of `n` entries and the array itself.
///
/// # Safety
/// array must be null or come from [`alloc_string_array`] with at least `n`
/// initialized entries.
pub unsafe fn free_string_array(array: *mut *mut c_char, n: usize) {
    if array.is_null() {
        return;
    }
    for i in 0..n {
        free_ptr(*array.add(i) as *mut core::ffi::c_void);
    }
    free(array as *mut core::ffi::c_void);
}

/// Free a C pointer using platform-appropriate free function.
///
/// # Safety
/// ptr must be either null or a valid pointer allocated by malloc.
#[inline]
pub unsafe fn free_ptr(ptr: *mut core::ffi::c_void) {
    if !ptr.is_null() {
        free(ptr);
    }
}

/// Macro to free multiple struct fields.
///
/// Usage:
/// ```ignore
/// free_fields!(result, field1, field2, field3);
/// ```
#[macro_export]
macro_rules! free_fields {
    ($result:expr, $($field:ident),+ $(,)?) => {{
        $(
            if !$result.$field.is_null() {
                $crate::allocation::free_ptr($result.$field as *mut core::ffi::c_void);
                $result.$field = std::ptr::null_mut();
            }
        )+
    }};
}
