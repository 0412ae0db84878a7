use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use crate::core::error::{Error, Result};

/// crc32 (u32 LE) + payload length (u64 LE)
const HEADER_LEN: usize = 12;

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    buffer.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buffer.extend_from_slice(payload);
    buffer
}

pub fn decode_frame(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::corruption("Truncated frame header"));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    let mut crc = [0u8; 4];
    let mut len = [0u8; 8];
    crc.copy_from_slice(&header[..4]);
    len.copy_from_slice(&header[4..]);

    if u64::from_le_bytes(len) != payload.len() as u64 {
        return Err(Error::corruption(format!(
            "Frame length mismatch: header says {}, found {}",
            u64::from_le_bytes(len),
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != u32::from_le_bytes(crc) {
        return Err(Error::corruption("Frame checksum mismatch"));
    }
    Ok(payload)
}

/// Read a framed file; `Ok(None)` if it does not exist
pub fn read_framed(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    decode_frame(&bytes)
        .map(|payload| Some(payload.to_vec()))
        .map_err(|e| Error::corruption(format!("{}: {}", path.display(), e.context)))
}

/// Write through a temp file and rename over the target
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
