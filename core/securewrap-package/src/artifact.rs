//! Artifact trailer codec.
//!
//! An artifact is the agent stub executable with a trailer appended:
//!
//! ```text
//! stub | manifest (TOML) | envelope | manifest_len u64 LE | envelope_len u64 LE | magic
//! ```
//!
//! The trailer is read from the end of the file, so the stub can be any
//! executable and needs no knowledge of its own size.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use securewrap_crypto::EncryptedEnvelope;

use crate::error::{PackageError, PackageResult};
use crate::manifest::PackageManifest;

/// Marks the end of every artifact.
pub const TRAILER_MAGIC: [u8; 8] = *b"SWRAPPK1";

/// Two lengths plus the magic.
pub const FOOTER_LEN: usize = 8 + 8 + TRAILER_MAGIC.len();

/// The parts of a package that travel inside the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArtifact {
    pub manifest: PackageManifest,
    pub envelope: EncryptedEnvelope,
}

impl PackageArtifact {
    pub fn new(manifest: PackageManifest, envelope: EncryptedEnvelope) -> Self {
        Self { manifest, envelope }
    }

    /// Serializes manifest, envelope and footer.
    pub fn to_trailer(&self) -> PackageResult<Vec<u8>> {
        self.manifest.validate()?;
        let manifest = self.manifest.to_toml()?.into_bytes();
        let envelope = self.envelope.to_bytes();

        let mut out = Vec::with_capacity(manifest.len() + envelope.len() + FOOTER_LEN);
        out.extend_from_slice(&manifest);
        out.extend_from_slice(&envelope);
        out.extend_from_slice(&(manifest.len() as u64).to_le_bytes());
        out.extend_from_slice(&(envelope.len() as u64).to_le_bytes());
        out.extend_from_slice(&TRAILER_MAGIC);
        Ok(out)
    }

    /// Appends the trailer to a copy of the stub executable.
    pub fn embed(&self, stub: &[u8]) -> PackageResult<Vec<u8>> {
        let trailer = self.to_trailer()?;
        let mut out = Vec::with_capacity(stub.len() + trailer.len());
        out.extend_from_slice(stub);
        out.extend_from_slice(&trailer);
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> PackageResult<Self> {
        Self::read_from(Cursor::new(bytes))
    }

    pub fn read_from_path(path: &Path) -> PackageResult<Self> {
        Self::read_from(File::open(path)?)
    }

    /// Parses the trailer at the end of `reader`.
    pub fn read_from<R: Read + Seek>(mut reader: R) -> PackageResult<Self> {
        let total = reader.seek(SeekFrom::End(0))?;
        if total < FOOTER_LEN as u64 {
            return Err(PackageError::NoTrailer);
        }

        let mut footer = [0u8; FOOTER_LEN];
        reader.seek(SeekFrom::Start(total - FOOTER_LEN as u64))?;
        reader.read_exact(&mut footer)?;
        if footer[16..] != TRAILER_MAGIC {
            return Err(PackageError::NoTrailer);
        }

        let manifest_len = read_u64(&footer[0..8]);
        let envelope_len = read_u64(&footer[8..16]);
        let body_len = manifest_len
            .checked_add(envelope_len)
            .filter(|len| *len <= total - FOOTER_LEN as u64)
            .ok_or_else(|| {
                PackageError::CorruptTrailer(format!(
                    "lengths {manifest_len} + {envelope_len} exceed file size {total}"
                ))
            })?;

        reader.seek(SeekFrom::Start(total - FOOTER_LEN as u64 - body_len))?;
        let manifest_bytes = read_exact_vec(&mut reader, manifest_len)?;
        let envelope_bytes = read_exact_vec(&mut reader, envelope_len)?;

        let manifest_text = std::str::from_utf8(&manifest_bytes)
            .map_err(|e| PackageError::ManifestInvalid(e.to_string()))?;
        let manifest = PackageManifest::from_toml(manifest_text)?;
        let envelope = EncryptedEnvelope::from_bytes(&envelope_bytes)?;

        Ok(Self { manifest, envelope })
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn read_exact_vec<R: Read>(reader: &mut R, len: u64) -> PackageResult<Vec<u8>> {
    let len = usize::try_from(len)
        .map_err(|_| PackageError::CorruptTrailer(format!("section of {len} bytes")))?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
