/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use std::io;
use thiserror::Error;

/// Error conditions that can be returned
#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    /// Network/HTTP-layer failure. The only retryable class; everything else
    /// propagates without a retry.
    #[error("Request network error")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication configuration error. {0}")]
    AuthConfiguration(String),

    #[error("Response body is not the expected wire format")]
    Protocol(#[from] serde_json::Error),

    #[error("URL Parse error")]
    UrlParsing(#[from] url::ParseError),

    #[error("API Response was error: {0}, msg: {1}")]
    ApiResponse(u32, String),

    #[error("Expected response missing")]
    ResponseMissing(),

    #[error("Upload response is malformed: {0}")]
    UploadResponseMalformed(String),

    #[error("Upload ticket {0} failed: {1}")]
    UploadTicket(String, String),
}
