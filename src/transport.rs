//! File-based exchange of job messages with out-of-process builders.
//!
//! Each message is written as a JSON envelope carrying the message's schema
//! version. Readers reject envelopes whose version differs from their own.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{CreateJobsRequest, CreateJobsResponse, ProcessJobRequest, ProcessJobResponse};

pub const PROCESS_JOB_REQUEST_FILE_NAME: &str = "ProcessJobRequest.json";
pub const PROCESS_JOB_RESPONSE_FILE_NAME: &str = "ProcessJobResponse.json";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("Failed to access job exchange file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed job exchange file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{message} schema version {found} is not supported (expected {expected})")]
    VersionMismatch { message: &'static str, expected: u32, found: u32 },
}

/// A message with a versioned logical schema.
pub trait Versioned {
    const MESSAGE: &'static str;
    const SCHEMA_VERSION: u32;
}

impl Versioned for CreateJobsRequest {
    const MESSAGE: &'static str = "CreateJobsRequest";
    const SCHEMA_VERSION: u32 = 2;
}

impl Versioned for CreateJobsResponse {
    const MESSAGE: &'static str = "CreateJobsResponse";
    const SCHEMA_VERSION: u32 = 1;
}

impl Versioned for ProcessJobRequest {
    const MESSAGE: &'static str = "ProcessJobRequest";
    const SCHEMA_VERSION: u32 = 2;
}

impl Versioned for ProcessJobResponse {
    const MESSAGE: &'static str = "ProcessJobResponse";
    const SCHEMA_VERSION: u32 = 3;
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    payload: T,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    schema_version: u32,
}

/// Encode a message into its JSON envelope.
pub fn encode<T: Serialize + Versioned>(message: &T) -> Result<String, TransportError> {
    let envelope = Envelope { schema_version: T::SCHEMA_VERSION, payload: message };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decode a JSON envelope, checking its schema version first.
pub fn decode<T: DeserializeOwned + Versioned>(text: &str) -> Result<T, TransportError> {
    let header: EnvelopeHeader = serde_json::from_str(text)?;
    if header.schema_version != T::SCHEMA_VERSION {
        return Err(TransportError::VersionMismatch {
            message: T::MESSAGE,
            expected: T::SCHEMA_VERSION,
            found: header.schema_version,
        });
    }
    let envelope: Envelope<T> = serde_json::from_str(text)?;
    Ok(envelope.payload)
}

pub fn write_message<T: Serialize + Versioned>(path: &Path, message: &T) -> Result<(), TransportError> {
    fs::write(path, encode(message)?)?;
    Ok(())
}

pub fn read_message<T: DeserializeOwned + Versioned>(path: &Path) -> Result<T, TransportError> {
    decode(&fs::read_to_string(path)?)
}

pub fn request_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(PROCESS_JOB_REQUEST_FILE_NAME)
}

pub fn response_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(PROCESS_JOB_RESPONSE_FILE_NAME)
}

/// Write `request` into `temp_dir` under the well-known request name.
pub fn write_request(temp_dir: &Path, request: &ProcessJobRequest) -> Result<PathBuf, TransportError> {
    let path = request_path(temp_dir);
    write_message(&path, request)?;
    Ok(path)
}

pub fn read_request(temp_dir: &Path) -> Result<ProcessJobRequest, TransportError> {
    read_message(&request_path(temp_dir))
}

/// Write `response` into `temp_dir` under the well-known response name.
pub fn write_response(temp_dir: &Path, response: &ProcessJobResponse) -> Result<PathBuf, TransportError> {
    let path = response_path(temp_dir);
    write_message(&path, response)?;
    Ok(path)
}

pub fn read_response(temp_dir: &Path) -> Result<ProcessJobResponse, TransportError> {
    read_message(&response_path(temp_dir))
}
