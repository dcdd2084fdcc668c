//! File header framing: magic, version, flags, and the optional
//! variable-length extensions gated on those flags.

use crate::error::{GicsError, Result};

pub const MAGIC: [u8; 4] = *b"GICS";

/// Base format version. Bumped to [`VERSION_EXTENDED`] whenever the
/// auth-verify or schema extensions are present.
pub const VERSION_BASE: u8 = 2;
pub const VERSION_EXTENDED: u8 = 3;

/// Highest version this decoder understands. A stored version above this
/// is a `VersionMismatchError`; a bad magic is an `IntegrityError`.
pub const MAX_SUPPORTED_VERSION: u8 = VERSION_EXTENDED;

/// The frozen v1.1 codec's version byte. Its bit layout is out of scope for
/// this crate (see `spec.md` §1, "Out of scope"); this decoder only needs to
/// recognize the byte well enough to dispatch it elsewhere rather than
/// misparse it as a v2/v3 header.
pub const VERSION_LEGACY: u8 = 1;

const FLAG_FIELDWISE_TS: u32 = 1 << 0;
const FLAG_CONTEXT_ENABLED: u32 = 1 << 1;
const FLAG_SCHEMA_PRESENT: u32 = 1 << 2;
const FLAG_ENCRYPTED: u32 = 1 << 3;
/// Records which outer codec a segment used, so a decoder can recover it
/// without guessing (see `DESIGN.md`, "Outer codec flag").
const FLAG_OUTER_ZSTD: u32 = 1 << 4;

/// Header flag bits. `fieldwise_ts` is a reserved bit this encoder never
/// sets; a decoder tolerates it being set on input produced elsewhere and
/// otherwise ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileFlags {
    pub fieldwise_ts: bool,
    pub context_enabled: bool,
    pub schema_present: bool,
    pub encrypted: bool,
    /// `true` when segments are ZSTD-compressed, `false` for NONE.
    pub outer_zstd: bool,
}

impl FileFlags {
    pub fn to_bits(self) -> u32 {
        let mut bits = 0u32;
        if self.fieldwise_ts {
            bits |= FLAG_FIELDWISE_TS;
        }
        if self.context_enabled {
            bits |= FLAG_CONTEXT_ENABLED;
        }
        if self.schema_present {
            bits |= FLAG_SCHEMA_PRESENT;
        }
        if self.encrypted {
            bits |= FLAG_ENCRYPTED;
        }
        if self.outer_zstd {
            bits |= FLAG_OUTER_ZSTD;
        }
        bits
    }

    pub fn from_bits(bits: u32) -> Self {
        FileFlags {
            fieldwise_ts: bits & FLAG_FIELDWISE_TS != 0,
            context_enabled: bits & FLAG_CONTEXT_ENABLED != 0,
            schema_present: bits & FLAG_SCHEMA_PRESENT != 0,
            encrypted: bits & FLAG_ENCRYPTED != 0,
            outer_zstd: bits & FLAG_OUTER_ZSTD != 0,
        }
    }

    pub fn outer_codec(self) -> crate::config::OuterCodec {
        if self.outer_zstd {
            crate::config::OuterCodec::Zstd
        } else {
            crate::config::OuterCodec::None
        }
    }

    fn version(self) -> u8 {
        if self.encrypted || self.schema_present {
            VERSION_EXTENDED
        } else {
            VERSION_BASE
        }
    }
}

/// The encryption extension: a 16-byte file-wide salt and the 32-byte
/// auth-verify HMAC token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionExtension {
    pub file_salt: [u8; 16],
    pub auth_verify: [u8; 32],
}

/// Parsed file header plus the offset where segment data begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub flags: FileFlags,
    pub context_id: Option<String>,
    pub encryption: Option<EncryptionExtension>,
    /// Treated as an opaque, verbatim-round-tripped blob; this crate does
    /// not interpret schema contents.
    pub schema: Option<Vec<u8>>,
}

impl FileHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.push(self.flags.version());
        out.extend_from_slice(&self.flags.to_bits().to_le_bytes());

        if self.flags.context_enabled {
            let id = self.context_id.as_deref().unwrap_or("");
            out.extend_from_slice(&(id.len() as u32).to_le_bytes());
            out.extend_from_slice(id.as_bytes());
        }
        if self.flags.encrypted {
            let ext = self
                .encryption
                .as_ref()
                .expect("encrypted flag set without an EncryptionExtension");
            out.extend_from_slice(&ext.file_salt);
            out.extend_from_slice(&ext.auth_verify);
        }
        if self.flags.schema_present {
            let schema = self.schema.as_deref().unwrap_or(&[]);
            out.extend_from_slice(&(schema.len() as u32).to_le_bytes());
            out.extend_from_slice(schema);
        }
    }

    pub fn read_from(buf: &[u8]) -> Result<(FileHeader, usize)> {
        if buf.len() < 9 {
            return Err(GicsError::incomplete("file shorter than fixed header"));
        }
        if buf[0..4] != MAGIC {
            return Err(GicsError::integrity("bad magic bytes"));
        }
        let version = buf[4];
        if version == VERSION_LEGACY {
            return Err(GicsError::version(
                "file uses the legacy v1.1 codec, which this decoder does not read",
            ));
        }
        if version < VERSION_BASE || version > MAX_SUPPORTED_VERSION {
            return Err(GicsError::version(format!(
                "unsupported file version {version}"
            )));
        }
        let flags = FileFlags::from_bits(u32::from_le_bytes(buf[5..9].try_into().unwrap()));
        if version != flags.version() {
            return Err(GicsError::integrity(
                "stored version does not match the extensions its flags declare",
            ));
        }

        let mut pos = 9usize;
        let context_id = if flags.context_enabled {
            let len = read_u32_len(buf, pos)?;
            pos += 4;
            if buf.len() < pos + len {
                return Err(GicsError::incomplete("contextId past buffer end"));
            }
            let s = std::str::from_utf8(&buf[pos..pos + len])
                .map_err(|_| GicsError::incomplete("contextId is not valid UTF-8"))?
                .to_string();
            pos += len;
            Some(s)
        } else {
            None
        };

        let encryption = if flags.encrypted {
            if buf.len() < pos + 16 + 32 {
                return Err(GicsError::incomplete("encryption extension past buffer end"));
            }
            let mut file_salt = [0u8; 16];
            file_salt.copy_from_slice(&buf[pos..pos + 16]);
            pos += 16;
            let mut auth_verify = [0u8; 32];
            auth_verify.copy_from_slice(&buf[pos..pos + 32]);
            pos += 32;
            Some(EncryptionExtension {
                file_salt,
                auth_verify,
            })
        } else {
            None
        };

        let schema = if flags.schema_present {
            let len = read_u32_len(buf, pos)?;
            pos += 4;
            if buf.len() < pos + len {
                return Err(GicsError::incomplete("schema blob past buffer end"));
            }
            let blob = buf[pos..pos + len].to_vec();
            pos += len;
            Some(blob)
        } else {
            None
        };

        Ok((
            FileHeader {
                flags,
                context_id,
                encryption,
                schema,
            },
            pos,
        ))
    }
}

fn read_u32_len(buf: &[u8], pos: usize) -> Result<usize> {
    if buf.len() < pos + 4 {
        return Err(GicsError::incomplete("length prefix past buffer end"));
    }
    Ok(u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_header_roundtrips() {
        let header = FileHeader {
            flags: FileFlags::default(),
            context_id: None,
            encryption: None,
            schema: None,
        };
        let mut out = Vec::new();
        header.write_to(&mut out);
        assert_eq!(&out[0..4], &MAGIC);
        assert_eq!(out[4], VERSION_BASE);

        let (parsed, consumed) = FileHeader::read_from(&out).unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(parsed, header);
    }

    #[test]
    fn header_with_all_extensions_roundtrips_and_bumps_version() {
        let header = FileHeader {
            flags: FileFlags {
                context_enabled: true,
                encrypted: true,
                schema_present: true,
                ..FileFlags::default()
            },
            context_id: Some("ctx-42".to_string()),
            encryption: Some(EncryptionExtension {
                file_salt: [9u8; 16],
                auth_verify: [7u8; 32],
            }),
            schema: Some(vec![1, 2, 3, 4]),
        };
        let mut out = Vec::new();
        header.write_to(&mut out);
        assert_eq!(out[4], VERSION_EXTENDED);

        let (parsed, consumed) = FileHeader::read_from(&out).unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(parsed, header);
    }

    #[test]
    fn bad_magic_is_integrity_error() {
        let mut out = Vec::new();
        out.extend_from_slice(b"XXXX");
        out.extend_from_slice(&[VERSION_BASE, 0, 0, 0, 0]);
        let err = FileHeader::read_from(&out).unwrap_err();
        assert!(matches!(err, GicsError::Integrity(_)));
    }

    #[test]
    fn future_version_is_version_mismatch() {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&[99, 0, 0, 0, 0]);
        let err = FileHeader::read_from(&out).unwrap_err();
        assert!(matches!(err, GicsError::VersionMismatch(_)));
    }

    #[test]
    fn legacy_v1_1_version_byte_is_version_mismatch_not_misparsed() {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&[VERSION_LEGACY, 0, 0, 0, 0]);
        let err = FileHeader::read_from(&out).unwrap_err();
        assert!(matches!(err, GicsError::VersionMismatch(_)));
    }

    #[test]
    fn version_flags_mismatch_is_integrity_error() {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        // VERSION_EXTENDED with flags that declare no extensions at all.
        out.extend_from_slice(&[VERSION_EXTENDED, 0, 0, 0, 0]);
        let err = FileHeader::read_from(&out).unwrap_err();
        assert!(matches!(err, GicsError::Integrity(_)));
    }

    #[test]
    fn truncated_header_is_incomplete() {
        let err = FileHeader::read_from(&MAGIC).unwrap_err();
        assert!(matches!(err, GicsError::IncompleteData(_)));
    }
}
