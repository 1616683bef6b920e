//! Shell-argument escaping.
//!
//! [`encode_for_os`] is a pure string transform: each character that is
//! neither ASCII alphanumeric nor in the codec's immune set is prefixed with
//! the codec's escape character.

use std::fmt;
use std::str::FromStr;

use crate::error::ExecError;

/// Characters left unescaped by every codec.
const IMMUNE: &[char] = &['-'];

/// Target shell dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsCodec {
    /// POSIX shells: backslash escaping.
    Unix,
    /// `cmd.exe`: caret escaping.
    Windows,
}

impl OsCodec {
    /// Codec for the platform this binary was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            OsCodec::Windows
        } else {
            OsCodec::Unix
        }
    }

    pub fn escape_char(self) -> char {
        match self {
            OsCodec::Unix => '\\',
            OsCodec::Windows => '^',
        }
    }

    pub fn immune(self) -> &'static [char] {
        IMMUNE
    }

    fn is_safe(self, c: char) -> bool {
        c.is_ascii_alphanumeric() || self.immune().contains(&c)
    }
}

impl fmt::Display for OsCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsCodec::Unix => "unix",
            OsCodec::Windows => "windows",
        })
    }
}

impl FromStr for OsCodec {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(OsCodec::Unix),
            "windows" => Ok(OsCodec::Windows),
            other => Err(ExecError::InvalidConfig(format!("unknown OS codec: {other}"))),
        }
    }
}

/// Escape `param` for use as a single command argument under `codec`.
pub fn encode_for_os(codec: OsCodec, param: &str) -> String {
    let escape = codec.escape_char();
    let mut out = String::with_capacity(param.len() * 2);
    for c in param.chars() {
        if !codec.is_safe(c) {
            out.push(escape);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphanumerics_pass_through() {
        assert_eq!(encode_for_os(OsCodec::Unix, "abcXYZ019"), "abcXYZ019");
        assert_eq!(encode_for_os(OsCodec::Windows, "abcXYZ019"), "abcXYZ019");
        assert_eq!(encode_for_os(OsCodec::Unix, ""), "");
    }

    #[test]
    fn unix_uses_backslash() {
        assert_eq!(encode_for_os(OsCodec::Unix, "a b"), "a\\ b");
        assert_eq!(encode_for_os(OsCodec::Unix, "x;rm -rf /"), "x\\;rm\\ -rf\\ \\/");
        assert_eq!(encode_for_os(OsCodec::Unix, "$(id)"), "\\$\\(id\\)");
    }

    #[test]
    fn windows_uses_caret() {
        assert_eq!(encode_for_os(OsCodec::Windows, "a&b"), "a^&b");
        assert_eq!(encode_for_os(OsCodec::Windows, "C:\\dir"), "C^:^\\dir");
    }

    #[test]
    fn immune_characters_are_kept() {
        assert_eq!(encode_for_os(OsCodec::Unix, "--verbose"), "--verbose");
    }

    #[test]
    fn non_ascii_is_escaped() {
        assert_eq!(encode_for_os(OsCodec::Unix, "é"), "\\é");
    }

    #[test]
    fn parse_codec() {
        assert_eq!("Unix".parse::<OsCodec>().unwrap(), OsCodec::Unix);
        assert_eq!(" windows ".parse::<OsCodec>().unwrap(), OsCodec::Windows);
        assert!("dos".parse::<OsCodec>().is_err());
        assert_eq!(OsCodec::Windows.to_string(), "windows");
    }
}
