//! Subcommand handlers.
//!
//! Each handler writes its result to `out`; `main` passes stdout. Handlers
//! never log plaintext, keys or command parameters.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::protocol::{ExecResponse, KeyResponse};
use executor::{CommandLine, Gate, OsCodec};
use sealed::{codec, Envelope, EnvelopeCipher, SealError, SensitiveBytes};
use tracing::info;

/// `keygen`: print a fresh key as JSON.
pub fn keygen(cipher: &EnvelopeCipher, out: &mut impl Write) -> Result<()> {
    let key = cipher.generate_key()?;
    let spec = cipher.spec();
    let response = KeyResponse {
        algorithm: spec.cipher_name().to_owned(),
        key_size_bits: spec.key_size_bits(),
        key: STANDARD.encode(key.as_bytes()),
    };
    write_json(out, &response)
}

/// `encrypt`: seal `plaintext` under the master key.
pub fn encrypt(
    cipher: &EnvelopeCipher,
    plaintext: SensitiveBytes,
    binary: bool,
    out: &mut impl Write,
) -> Result<()> {
    let envelope = cipher.seal(&plaintext)?;
    drop(plaintext);
    if binary {
        out.write_all(&codec::serialize(&envelope)?)?;
    } else {
        writeln!(out, "{}", codec::to_portable_string(&envelope)?)?;
    }
    Ok(())
}

/// `decrypt`: open an envelope under the master key and write the plaintext.
pub fn decrypt(
    cipher: &EnvelopeCipher,
    input: &[u8],
    binary: bool,
    out: &mut impl Write,
) -> Result<()> {
    let envelope = parse_envelope(input, binary)?;
    let plaintext = cipher.open(&envelope)?;
    out.write_all(plaintext.as_bytes()?)?;
    Ok(())
}

/// `inspect`: print an [`EnvelopeReport`](common::protocol::EnvelopeReport).
pub fn inspect(input: &[u8], binary: bool, out: &mut impl Write) -> Result<()> {
    let envelope = parse_envelope(input, binary)?;
    write_json(out, &envelope.report())
}

/// `exec`: run an allow-listed executable and print its captured output.
pub fn exec(
    gate: &Gate,
    codec: OsCodec,
    executable: PathBuf,
    workdir: Option<PathBuf>,
    args: Vec<String>,
    out: &mut impl Write,
) -> Result<()> {
    let mut builder = CommandLine::builder(executable).args(args);
    if let Some(dir) = workdir {
        builder = builder.workdir(dir);
    }
    let output = gate.execute(&builder.build(codec))?;
    info!(status = ?output.status, "exec finished");
    write_json(out, &ExecResponse::from(output))
}

/// Read all of `path`, or stdin when `None`.
pub fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(p) => fs::read(p).with_context(|| format!("failed to read {}", p.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn parse_envelope(input: &[u8], binary: bool) -> Result<Envelope, SealError> {
    if binary {
        return codec::deserialize(input);
    }
    let text = std::str::from_utf8(input)
        .map_err(|_| SealError::Malformed("envelope text is not UTF-8".into()))?;
    codec::from_portable_string(text)
}

fn write_json<T: serde::Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("failed to write JSON output")?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::protocol::EnvelopeReport;
    use common::ErrorKind;
    use sealed::{AlgorithmSpec, SecretKey};

    fn cipher() -> EnvelopeCipher {
        EnvelopeCipher::new(AlgorithmSpec::default())
            .with_master_key(SecretKey::from_bytes(&[0u8; 16]))
            .unwrap()
    }

    fn seal_kind(err: &anyhow::Error) -> Option<ErrorKind> {
        err.downcast_ref::<SealError>().map(SealError::kind)
    }

    #[test]
    fn keygen_prints_sized_key() {
        let mut out = Vec::new();
        keygen(&cipher(), &mut out).unwrap();
        let resp: KeyResponse = serde_json::from_slice(&out).unwrap();
        assert_eq!(resp.algorithm, "AES/CBC/PKCS5Padding");
        assert_eq!(resp.key_size_bits, 128);
        assert_eq!(STANDARD.decode(resp.key).unwrap().len(), 16);
    }

    #[test]
    fn text_round_trip() {
        let c = cipher();
        let mut sealed_out = Vec::new();
        encrypt(&c, SensitiveBytes::from("Hello"), false, &mut sealed_out).unwrap();
        assert_eq!(sealed_out.last(), Some(&b'\n'));

        let mut plain = Vec::new();
        decrypt(&c, &sealed_out, false, &mut plain).unwrap();
        assert_eq!(plain, b"Hello");
    }

    #[test]
    fn binary_round_trip_and_inspect() {
        let c = cipher();
        let mut sealed_out = Vec::new();
        encrypt(&c, SensitiveBytes::from("Hello"), true, &mut sealed_out).unwrap();
        assert_eq!(sealed_out.len(), 117);

        let mut report = Vec::new();
        inspect(&sealed_out, true, &mut report).unwrap();
        let r: EnvelopeReport = serde_json::from_slice(&report).unwrap();
        assert_eq!(r.format_version, "current");
        assert_eq!(r.ciphertext_length, 16);
        assert!(r.integrity_tag_present);
    }

    #[test]
    fn decrypt_with_other_key_is_integrity() {
        let mut sealed_out = Vec::new();
        encrypt(&cipher(), SensitiveBytes::from("x"), false, &mut sealed_out).unwrap();

        let other = EnvelopeCipher::new(AlgorithmSpec::default())
            .with_master_key(SecretKey::from_bytes(&[9u8; 16]))
            .unwrap();
        let err = decrypt(&other, &sealed_out, false, &mut Vec::new()).unwrap_err();
        assert_eq!(seal_kind(&err), Some(ErrorKind::Integrity));
    }

    #[test]
    fn encrypt_without_master_key_is_state() {
        let c = EnvelopeCipher::new(AlgorithmSpec::default());
        let err = encrypt(&c, SensitiveBytes::from("x"), false, &mut Vec::new()).unwrap_err();
        assert_eq!(seal_kind(&err), Some(ErrorKind::State));
    }

    #[test]
    fn inspect_rejects_garbage() {
        let err = inspect(b"%%%", false, &mut Vec::new()).unwrap_err();
        assert_eq!(seal_kind(&err), Some(ErrorKind::MalformedInput));

        let err = inspect(&[0x7f, 0, 0], true, &mut Vec::new()).unwrap_err();
        assert_eq!(seal_kind(&err), Some(ErrorKind::UnsupportedFormat));
    }

    #[test]
    fn exec_refuses_unlisted_executable() {
        let gate = Gate::new(&executor::ExecutorConfig::default()).unwrap();
        let err = exec(
            &gate,
            OsCodec::Unix,
            PathBuf::from("/no/such/tool"),
            None,
            vec!["arg".into()],
            &mut Vec::new(),
        )
        .unwrap_err();
        let kind = err.downcast_ref::<executor::ExecError>().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::Policy));
    }

    #[test]
    fn read_input_from_file() {
        let path = std::env::temp_dir().join(format!("sealctl-read-{}", std::process::id()));
        fs::write(&path, b"payload").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), b"payload");
        fs::remove_file(&path).unwrap();
        assert!(read_input(Some(&path)).is_err());
    }
}
