//! [`SensitiveBytes`]: an exclusively-owned buffer of secret material.
//!
//! The buffer is overwritten with zeroes by [`SensitiveBytes::wipe`] and again
//! on drop, so every exit path clears it. After a wipe every read fails with
//! [`SealError::Wiped`]. There is no `Clone` impl; copies go through
//! [`SensitiveBytes::try_clone`] so each one is explicit.

use std::fmt;

use zeroize::Zeroize;

use crate::error::SealError;

/// Owned, wipeable buffer holding plaintext or other secret bytes.
pub struct SensitiveBytes {
    bytes: Vec<u8>,
    wiped: bool,
}

impl SensitiveBytes {
    /// Take ownership of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            wiped: false,
        }
    }

    /// Borrow the contents.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Wiped`] once [`wipe`](Self::wipe) has run.
    pub fn as_bytes(&self) -> Result<&[u8], SealError> {
        if self.wiped {
            return Err(SealError::Wiped);
        }
        Ok(&self.bytes)
    }

    /// Mutably borrow the contents.
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8], SealError> {
        if self.wiped {
            return Err(SealError::Wiped);
        }
        Ok(&mut self.bytes)
    }

    /// Borrow the contents as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Wiped`] after a wipe, or [`SealError::InvalidUtf8`]
    /// if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Result<&str, SealError> {
        std::str::from_utf8(self.as_bytes()?).map_err(|_| SealError::InvalidUtf8)
    }

    /// Make an explicit copy. The copy is independently owned and must be
    /// wiped (or dropped) on its own.
    pub fn try_clone(&self) -> Result<Self, SealError> {
        Ok(Self::new(self.as_bytes()?.to_vec()))
    }

    /// Number of bytes held. Zero after a wipe.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_wiped(&self) -> bool {
        self.wiped
    }

    /// Overwrite the buffer (including spare capacity) with zeroes and mark it
    /// unreadable. Idempotent.
    pub fn wipe(&mut self) {
        self.bytes.zeroize();
        self.wiped = true;
    }

    /// Raw access to the backing vector for in-place cipher operations.
    pub(crate) fn buffer_mut(&mut self) -> Result<&mut Vec<u8>, SealError> {
        if self.wiped {
            return Err(SealError::Wiped);
        }
        Ok(&mut self.bytes)
    }
}

impl Drop for SensitiveBytes {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl From<Vec<u8>> for SensitiveBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SensitiveBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for SensitiveBytes {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<String> for SensitiveBytes {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wiped {
            f.write_str("SensitiveBytes([WIPED])")
        } else {
            write!(f, "SensitiveBytes([REDACTED; {}])", self.bytes.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_wipe() {
        let p = SensitiveBytes::from("Hello");
        assert_eq!(p.as_bytes().unwrap(), b"Hello");
        assert_eq!(p.as_str().unwrap(), "Hello");
        assert_eq!(p.len(), 5);
        assert!(!p.is_wiped());
    }

    #[test]
    fn wipe_blocks_further_reads() {
        let mut p = SensitiveBytes::from("secret");
        p.wipe();
        assert!(p.is_wiped());
        assert!(matches!(p.as_bytes(), Err(SealError::Wiped)));
        assert!(matches!(p.as_str(), Err(SealError::Wiped)));
        assert!(matches!(p.as_bytes_mut(), Err(SealError::Wiped)));
        assert!(matches!(p.try_clone(), Err(SealError::Wiped)));
        // Idempotent.
        p.wipe();
        assert!(p.is_wiped());
    }

    #[test]
    fn try_clone_is_independent() {
        let original = SensitiveBytes::from("copy me");
        let mut copy = original.try_clone().unwrap();
        copy.wipe();
        assert_eq!(original.as_bytes().unwrap(), b"copy me");
    }

    #[test]
    fn mutation_through_as_bytes_mut() {
        let mut p = SensitiveBytes::from(vec![1u8, 2, 3]);
        p.as_bytes_mut().unwrap()[0] = 9;
        assert_eq!(p.as_bytes().unwrap(), &[9, 2, 3]);
    }

    #[test]
    fn non_utf8_as_str_fails() {
        let p = SensitiveBytes::from(vec![0xffu8, 0xfe]);
        assert!(matches!(p.as_str(), Err(SealError::InvalidUtf8)));
        assert!(p.as_bytes().is_ok());
    }

    #[test]
    fn debug_is_redacted() {
        let mut p = SensitiveBytes::from("hunter2");
        let dbg = format!("{p:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("hunter2"));
        p.wipe();
        assert!(format!("{p:?}").contains("WIPED"));
    }
}
