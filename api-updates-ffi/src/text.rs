//! Text at the boundary.
//!
//! `String` has no stable layout, so it never crosses the boundary.
//! Parameters take an [`AbiStr`] view; returned text is an [`AbiString`],
//! a byte buffer owned by this library and released through
//! `api_v0_string_free`.
//!
//! How text is encoded in those bytes is representation-sensitive inline
//! code. Each representation gets its own tagged scope, selected at compile
//! time: `inline_v0_utf8` by default, `inline_v0_utf16` with the
//! `utf16-text` feature.

use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;
use std::slice;

use crate::error::FfiError;
use crate::export::export;

/// Non-owning view of boundary text.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AbiStr<'a> {
    pub ptr: *const u8,
    pub len: usize,
    _marker: PhantomData<&'a [u8]>,
}

impl<'a> AbiStr<'a> {
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// View raw bytes handed over by a foreign caller.
    ///
    /// # Safety
    /// `ptr` must be null or valid for reads of `len` bytes for `'a`.
    pub const unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        if self.ptr.is_null() || self.len == 0 {
            &[]
        } else {
            // SAFETY: constructed from a live slice, or vouched for by the
            // caller of `from_raw_parts`.
            unsafe { slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    /// Decode with the active representation.
    pub fn decode(&self) -> Result<String, FfiError> {
        repr::decode(self.as_bytes())
    }
}

impl Default for AbiStr<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> From<&'a [u8]> for AbiStr<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
            _marker: PhantomData,
        }
    }
}

/// Owned boundary text.
#[repr(C)]
#[derive(Debug)]
pub struct AbiString {
    ptr: *mut u8,
    len: usize,
    cap: usize,
}

impl AbiString {
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut bytes = ManuallyDrop::new(bytes);
        Self {
            ptr: bytes.as_mut_ptr(),
            len: bytes.len(),
            cap: bytes.capacity(),
        }
    }

    /// Encode `text` with the active representation.
    pub fn encode(text: &str) -> Self {
        Self::from_bytes(repr::encode(text))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_abi_str(&self) -> AbiStr<'_> {
        if self.ptr.is_null() {
            AbiStr::empty()
        } else {
            // SAFETY: ptr/len come from a Vec this value still owns.
            unsafe { AbiStr::from_raw_parts(self.ptr, self.len) }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let this = ManuallyDrop::new(self);
        if this.ptr.is_null() {
            Vec::new()
        } else {
            // SAFETY: ptr/len/cap were taken from a Vec in `from_bytes` and
            // ownership has not been released.
            unsafe { Vec::from_raw_parts(this.ptr, this.len, this.cap) }
        }
    }

    pub fn decode(&self) -> Result<String, FfiError> {
        self.as_abi_str().decode()
    }
}

impl Default for AbiString {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for AbiString {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: see `into_bytes`.
            unsafe { drop(Vec::from_raw_parts(self.ptr, self.len, self.cap)) };
        }
    }
}

/// Release text returned by this library.
#[no_mangle]
pub extern "C" fn api_v0_string_free(text: AbiString) {
    drop(text);
}
export!(api_v0_string_free, "v0");

#[cfg(not(feature = "utf16-text"))]
pub mod inline_v0_utf8 {
    use crate::error::FfiError;
    use crate::export::inline_item;

    pub const TAG: &str = "utf8";

    inline_item! { "inline_v0_utf8", "encode",
        #[inline]
        pub fn encode(text: &str) -> Vec<u8> {
            text.as_bytes().to_vec()
        }
    }

    inline_item! { "inline_v0_utf8", "decode",
        #[inline]
        pub fn decode(bytes: &[u8]) -> Result<String, FfiError> {
            String::from_utf8(bytes.to_vec()).map_err(|_| FfiError::InvalidText)
        }
    }
}

#[cfg(feature = "utf16-text")]
pub mod inline_v0_utf16 {
    use crate::error::FfiError;
    use crate::export::inline_item;

    pub const TAG: &str = "utf16";

    inline_item! { "inline_v0_utf16", "encode",
        #[inline]
        pub fn encode(text: &str) -> Vec<u8> {
            text.encode_utf16().flat_map(u16::to_le_bytes).collect()
        }
    }

    inline_item! { "inline_v0_utf16", "decode",
        #[inline]
        pub fn decode(bytes: &[u8]) -> Result<String, FfiError> {
            if bytes.len() % 2 != 0 {
                return Err(FfiError::InvalidText);
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|_| FfiError::InvalidText)
        }
    }
}

/// Active text representation.
#[cfg(not(feature = "utf16-text"))]
pub use inline_v0_utf8 as repr;
#[cfg(feature = "utf16-text")]
pub use inline_v0_utf16 as repr;

/// Encode with the active representation.
pub fn encode(text: &str) -> Vec<u8> {
    repr::encode(text)
}
