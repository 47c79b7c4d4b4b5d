//! C ABI exports for tracescan.
//!
//! Produces a single shared library (`libtracescan_ffi`) consumed through
//! the generated `tracescan.h`. All inputs are pointer+length buffers,
//! borrowed for the duration of the call only; all returned handles are
//! opaque and freed through the matching `tracescan_close` /
//! `tracescan_del_response` call.
//!
//! Response strings (`tracescan_response_value`,
//! `tracescan_response_lastkey`) are borrowed from the response and stay
//! valid until `tracescan_del_response`. Values are copied into
//! NUL-terminated storage at scan time; a value containing an interior NUL
//! is truncated at the first NUL, since the accessors are not
//! length-qualified.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_longlong, c_ulonglong, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;

use tracescan_core::{compile, Instance, Response, ScanRequest};

/// Opaque store handle returned by [`tracescan_open`].
pub struct ScanInstance {
    inner: Instance,
}

/// Opaque result page returned by [`tracescan_scan`].
pub struct ScanResponse {
    values: Vec<CString>,
    last_key: CString,
    more: bool,
}

impl ScanResponse {
    fn from_core(response: Response) -> ScanResponse {
        let more = response.more();
        let last_key = nul_terminated(response.last_key().to_vec());
        let values = response.into_values().into_iter().map(nul_terminated).collect();
        ScanResponse {
            values,
            last_key,
            more,
        }
    }
}

/// Copy bytes into NUL-terminated storage, truncating at an interior NUL.
fn nul_terminated(bytes: Vec<u8>) -> CString {
    match CString::new(bytes) {
        Ok(s) => s,
        Err(err) => {
            let position = err.nul_position();
            let mut bytes = err.into_vec();
            bytes.truncate(position);
            // No interior NUL can remain before the first one.
            unsafe { CString::from_vec_unchecked(bytes) }
        }
    }
}

// ---------------------------------------------------------------------------
// Thread-local error storage
// ---------------------------------------------------------------------------

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message in thread-local storage.
fn set_last_error(msg: String) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear thread-local error (called on success).
fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

fn ffi_error_json(code: &str, message: &str) -> String {
    serde_json::json!({
        "code": code,
        "message": message,
    })
    .to_string()
}

/// Borrow an input buffer. Null or zero-length means an empty buffer.
unsafe fn buffer_arg<'a>(ptr: *const u8, len: c_ulonglong) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len as usize) }
    }
}

// ---------------------------------------------------------------------------
// Instance lifecycle
// ---------------------------------------------------------------------------

/// Open the store at `dir` read-only, or as a secondary follower when
/// `secondary_ptr` names a non-empty scratch directory.
///
/// Returns an opaque instance handle, or `NULL` on failure (call
/// `tracescan_last_error` for the error JSON). Free with `tracescan_close`.
///
/// # Safety
///
/// `dir_ptr` and `secondary_ptr` must each be null or point to `dir_len` /
/// `secondary_len` readable bytes of UTF-8 path data.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_open(
    dir_ptr: *const u8,
    dir_len: c_ulonglong,
    secondary_ptr: *const u8,
    secondary_len: c_ulonglong,
) -> *mut ScanInstance {
    let result = catch_unwind(|| {
        let dir = unsafe { buffer_arg(dir_ptr, dir_len) };
        if dir.is_empty() {
            set_last_error(ffi_error_json("open_failure", "Data directory is empty"));
            return ptr::null_mut();
        }
        let Ok(dir) = std::str::from_utf8(dir) else {
            set_last_error(ffi_error_json("utf8_error", "Invalid UTF-8 in data directory"));
            return ptr::null_mut();
        };

        let secondary = unsafe { buffer_arg(secondary_ptr, secondary_len) };
        let opened = if secondary.is_empty() {
            Instance::open(dir)
        } else {
            match std::str::from_utf8(secondary) {
                Ok(secondary) => Instance::open_secondary(dir, secondary),
                Err(_) => {
                    set_last_error(ffi_error_json(
                        "utf8_error",
                        "Invalid UTF-8 in secondary directory",
                    ));
                    return ptr::null_mut();
                }
            }
        };

        match opened {
            Ok(inner) => {
                clear_last_error();
                Box::into_raw(Box::new(ScanInstance { inner }))
            }
            Err(err) => {
                set_last_error(err.to_json().to_string());
                ptr::null_mut()
            }
        }
    });

    result.unwrap_or_else(|_| {
        set_last_error(ffi_error_json("panic", "Panic inside Rust FFI"));
        ptr::null_mut()
    })
}

/// Close an instance. Passing `NULL` is a no-op.
///
/// # Safety
///
/// `instance` must be a handle returned by `tracescan_open` (or null) and
/// must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_close(instance: *mut ScanInstance) {
    if instance.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(instance) });
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Run one paginated filtered range scan.
///
/// `start` / `end` bound the key range; null or zero-length means
/// unbounded on that side. `max_count` caps the page; values `<= 0` use
/// the compiled-in default of 1000.
///
/// Returns an opaque response handle, or `NULL` on failure (invalid
/// predicate or store error; see `tracescan_last_error`). Free with
/// `tracescan_del_response`.
///
/// # Safety
///
/// `instance` must be a live handle from `tracescan_open`. Each buffer
/// pointer must be null or point to the given number of readable bytes;
/// the buffers are borrowed only for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_scan(
    instance: *const ScanInstance,
    query_ptr: *const u8,
    query_len: c_ulonglong,
    start_ptr: *const u8,
    start_len: c_ulonglong,
    end_ptr: *const u8,
    end_len: c_ulonglong,
    max_count: c_longlong,
) -> *mut ScanResponse {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if instance.is_null() {
            set_last_error(ffi_error_json("null_pointer", "Null instance handle"));
            return ptr::null_mut();
        }
        let instance = unsafe { &*instance };

        let request = ScanRequest {
            query: unsafe { buffer_arg(query_ptr, query_len) }.to_vec(),
            start_key: unsafe { buffer_arg(start_ptr, start_len) }.to_vec(),
            end_key: unsafe { buffer_arg(end_ptr, end_len) }.to_vec(),
            max_count: if max_count <= 0 { 0 } else { max_count as usize },
        };

        match instance.inner.scan(&request) {
            Ok(response) => {
                clear_last_error();
                Box::into_raw(Box::new(ScanResponse::from_core(response)))
            }
            Err(err) => {
                set_last_error(err.to_json().to_string());
                ptr::null_mut()
            }
        }
    }));

    result.unwrap_or_else(|_| {
        set_last_error(ffi_error_json("panic", "Panic inside Rust FFI"));
        ptr::null_mut()
    })
}

/// Compile-check a serialized predicate without opening a store.
///
/// Returns 1 when the query compiles, 0 otherwise (the error JSON is
/// available from `tracescan_last_error`).
///
/// # Safety
///
/// `query_ptr` must be null or point to `query_len` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_check_query(
    query_ptr: *const u8,
    query_len: c_ulonglong,
) -> c_int {
    let result = catch_unwind(|| {
        let query = unsafe { buffer_arg(query_ptr, query_len) };
        if query.is_empty() {
            set_last_error(ffi_error_json("json_parse_error", "Empty query buffer"));
            return 0;
        }
        match compile(query) {
            Ok(_) => {
                clear_last_error();
                1
            }
            Err(err) => {
                set_last_error(err.to_json().to_string());
                0
            }
        }
    });
    result.unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Response accessors
// ---------------------------------------------------------------------------

/// Number of values in a response. 0 on null.
///
/// # Safety
///
/// `response` must be null or a live handle from `tracescan_scan`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_response_size(response: *const ScanResponse) -> c_ulonglong {
    if response.is_null() {
        return 0;
    }
    unsafe { &*response }.values.len() as c_ulonglong
}

/// 1 when the page was cut for size and more matches may remain.
///
/// # Safety
///
/// `response` must be null or a live handle from `tracescan_scan`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_response_more(response: *const ScanResponse) -> c_int {
    if response.is_null() {
        return 0;
    }
    unsafe { &*response }.more as c_int
}

/// The key to resume from, empty unless `tracescan_response_more` is 1.
///
/// The returned string is borrowed from the response and valid until
/// `tracescan_del_response`. Do **not** free it.
///
/// # Safety
///
/// `response` must be null or a live handle from `tracescan_scan`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_response_lastkey(
    response: *const ScanResponse,
) -> *const c_char {
    if response.is_null() {
        return ptr::null();
    }
    unsafe { &*response }.last_key.as_ptr()
}

/// The raw JSON value at `index`, in key order. `NULL` when `index` is out
/// of range.
///
/// The returned string is borrowed from the response and valid until
/// `tracescan_del_response`. Do **not** free it.
///
/// # Safety
///
/// `response` must be null or a live handle from `tracescan_scan`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_response_value(
    response: *const ScanResponse,
    index: c_ulonglong,
) -> *const c_char {
    if response.is_null() {
        return ptr::null();
    }
    unsafe { &*response }
        .values
        .get(index as usize)
        .map(|value| value.as_ptr())
        .unwrap_or(ptr::null())
}

/// Free a response and every string borrowed from it. Passing `NULL` is a
/// no-op.
///
/// # Safety
///
/// `response` must be a handle returned by `tracescan_scan` (or null) and
/// must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tracescan_del_response(response: *mut ScanResponse) {
    if response.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(response) });
}

// ---------------------------------------------------------------------------
// Error reporting
// ---------------------------------------------------------------------------

/// Return the last error as a JSON string, or `NULL` if no error.
///
/// The returned pointer is valid until the next FFI call on the same
/// thread. Do **not** free this pointer.
#[unsafe(no_mangle)]
pub extern "C" fn tracescan_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}
