use crate::core::error::{Error, ErrorKind, Result};
use serde::{Serialize, Deserialize};

/// Compressed payload of one serialized node
#[derive(Debug, Serialize, Deserialize)]
pub struct CompressedBlock {
    pub data: Vec<u8>,
    pub original_size: usize,
    pub compression: CompressionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    LZ4,      // Fastest, default for node files
    Zstd,     // Smallest files, slower imports
    Snappy,
}

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Self> {
        let compressed = match compression {
            CompressionType::None => data.to_vec(),

            CompressionType::LZ4 => {
                lz4::block::compress(data, None, false)?
            }

            CompressionType::Zstd => {
                zstd::encode_all(data, 3)?
            }

            CompressionType::Snappy => {
                use snap::raw::Encoder;
                let mut encoder = Encoder::new();
                encoder.compress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?
            }
        };

        Ok(CompressedBlock {
            data: compressed,
            original_size: data.len(),
            compression,
        })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        let data = match self.compression {
            CompressionType::None => self.data.clone(),

            CompressionType::LZ4 => {
                let size = i32::try_from(self.original_size)
                    .map_err(|_| Error::corruption("Block too large for LZ4"))?;
                lz4::block::decompress(&self.data, Some(size))
                    .map_err(|e| Error::new(ErrorKind::Corruption, e.to_string()))?
            }

            CompressionType::Zstd => {
                zstd::decode_all(&self.data[..])
                    .map_err(|e| Error::new(ErrorKind::Corruption, e.to_string()))?
            }

            CompressionType::Snappy => {
                use snap::raw::Decoder;
                let mut decoder = Decoder::new();
                decoder.decompress_vec(&self.data)
                    .map_err(|e| Error::new(ErrorKind::Corruption, e.to_string()))?
            }
        };

        if data.len() != self.original_size {
            return Err(Error::corruption(format!(
                "Decompressed {} bytes, expected {}",
                data.len(),
                self.original_size
            )));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_codec_restores_the_payload() {
        let payload: Vec<u8> = b"MKVLAAGIVALLLAAGCSSSKKVLAAG".repeat(40);
        for compression in [
            CompressionType::None,
            CompressionType::LZ4,
            CompressionType::Zstd,
            CompressionType::Snappy,
        ] {
            let block = CompressedBlock::compress(&payload, compression).unwrap();
            assert_eq!(block.decompress().unwrap(), payload, "{:?}", compression);
        }
    }

    #[test]
    fn size_mismatch_is_corruption() {
        let mut block = CompressedBlock::compress(b"PEPTIDE", CompressionType::None).unwrap();
        block.original_size = 3;
        assert_eq!(block.decompress().unwrap_err().kind, ErrorKind::Corruption);
    }
}
