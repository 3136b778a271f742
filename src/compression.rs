use crate::{error::VoxStreamError, CompressionType};
use std::io::{Read, Write};

const BROTLI_BUFFER_SIZE: usize = 4096;
const BROTLI_QUALITY: u32 = 4;
const BROTLI_LGWIN: u32 = 22;
const ZSTD_LEVEL: i32 = 3;

impl CompressionType {
    /// 将压缩类型值转换为枚举
    pub fn from_u8(value: u8) -> Result<CompressionType, VoxStreamError> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zstandard),
            2 => Ok(CompressionType::LZ4),
            3 => Ok(CompressionType::Brotli),
            _ => Err(VoxStreamError::UnsupportedCompression(value)),
        }
    }

    /// 按名称解析压缩类型（CLI参数用）
    pub fn from_name(name: &str) -> Option<CompressionType> {
        match name.to_lowercase().as_str() {
            "none" => Some(CompressionType::None),
            "zstd" => Some(CompressionType::Zstandard),
            "lz4" => Some(CompressionType::LZ4),
            "brotli" => Some(CompressionType::Brotli),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompressionType::None => "无压缩",
            CompressionType::Zstandard => "Zstandard",
            CompressionType::LZ4 => "LZ4",
            CompressionType::Brotli => "Brotli",
        }
    }

    /// 压缩会话载荷
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, VoxStreamError> {
        match self {
            CompressionType::None => Ok(data.to_vec()),

            CompressionType::Zstandard => {
                let mut compressed = Vec::new();
                let mut encoder = zstd::Encoder::new(&mut compressed, ZSTD_LEVEL)?;
                encoder.write_all(data)?;
                encoder.finish()?;
                Ok(compressed)
            }

            CompressionType::LZ4 => {
                let mut compressed = Vec::new();
                let mut encoder = lz4::EncoderBuilder::new().build(&mut compressed)?;
                encoder.write_all(data)?;
                // 必须finish才会写出帧尾
                let (_, result) = encoder.finish();
                result?;
                Ok(compressed)
            }

            CompressionType::Brotli => {
                let mut compressed = Vec::new();
                let mut encoder = brotli::CompressorWriter::new(
                    &mut compressed,
                    BROTLI_BUFFER_SIZE,
                    BROTLI_QUALITY,
                    BROTLI_LGWIN,
                );
                encoder.write_all(data)?;
                encoder.flush()?;
                drop(encoder);
                Ok(compressed)
            }
        }
    }

    /// 解压会话载荷
    pub fn decompress(&self, compressed: &[u8]) -> Result<Vec<u8>, VoxStreamError> {
        match self {
            CompressionType::None => Ok(compressed.to_vec()),

            CompressionType::Zstandard => {
                let mut decompressed = Vec::new();
                let mut decoder = zstd::Decoder::new(compressed)?;
                decoder.read_to_end(&mut decompressed)?;
                Ok(decompressed)
            }

            CompressionType::LZ4 => {
                let mut decompressed = Vec::new();
                let mut decoder = lz4::Decoder::new(compressed)?;
                decoder.read_to_end(&mut decompressed)?;
                Ok(decompressed)
            }

            CompressionType::Brotli => {
                let mut decompressed = Vec::new();
                let mut decoder = brotli::Decompressor::new(compressed, BROTLI_BUFFER_SIZE);
                decoder.read_to_end(&mut decompressed)?;
                Ok(decompressed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_algorithm_roundtrips() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();

        for compression in [
            CompressionType::None,
            CompressionType::Zstandard,
            CompressionType::LZ4,
            CompressionType::Brotli,
        ] {
            let compressed = compression.compress(&data).unwrap();
            let restored = compression.decompress(&compressed).unwrap();
            assert_eq!(restored, data, "{}", compression.name());
        }
    }

    #[test]
    fn unknown_compression_byte_is_rejected() {
        assert!(matches!(
            CompressionType::from_u8(9),
            Err(VoxStreamError::UnsupportedCompression(9))
        ));
    }
}
