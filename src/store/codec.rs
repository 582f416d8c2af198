//! Snapshot codec: JSON text compressed with zstd.

use serde::de::DeserializeOwned;

use crate::errors::AppError;

const COMPRESSION_LEVEL: i32 = 9;

pub fn compress(json: &[u8]) -> Result<Vec<u8>, AppError> {
    zstd::bulk::compress(json, COMPRESSION_LEVEL)
        .map_err(|e| AppError::Internal(format!("Compression failed: {}", e)))
}

pub fn decompress(payload: &[u8]) -> Result<Vec<u8>, AppError> {
    zstd::stream::decode_all(payload)
        .map_err(|e| AppError::Decode(format!("Invalid compressed payload: {}", e)))
}

pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, AppError> {
    Ok(serde_json::from_slice(&decompress(payload)?)?)
}
