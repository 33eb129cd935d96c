/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use bytes::{BufMut, Bytes, BytesMut};

const BOUNDARY: &str = "----------ThIs-Is-tHe-bouNdaRY-7d3a1";
const CRLF: &[u8] = b"\r\n";

/// A file to be carried in a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub data: Bytes,
}

impl FilePart {
    pub fn new(name: &str, filename: &str, data: Bytes) -> Self {
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            data,
        }
    }
}

/// Encodes fields and files as a multipart/form-data body.
///
/// `fields` is a sequence of (name, value) form fields, `files` the data to
/// be uploaded as files. Parts appear in call order, fields first. Returns
/// the Content-Type header value and the body.
pub fn encode_multipart_formdata(
    fields: &[(String, String)],
    files: &[FilePart],
) -> (String, Bytes) {
    let mut body = BytesMut::new();
    for (name, value) in fields {
        body.put_slice(format!("--{BOUNDARY}").as_bytes());
        body.put_slice(CRLF);
        body.put_slice(format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes());
        body.put_slice(CRLF);
        body.put_slice(CRLF);
        body.put_slice(value.as_bytes());
        body.put_slice(CRLF);
    }
    for file in files {
        body.put_slice(format!("--{BOUNDARY}").as_bytes());
        body.put_slice(CRLF);
        body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                file.name, file.filename
            )
            .as_bytes(),
        );
        body.put_slice(CRLF);
        body.put_slice(format!("Content-Type: {}", guess_content_type(&file.filename)).as_bytes());
        body.put_slice(CRLF);
        body.put_slice(CRLF);
        body.put_slice(&file.data);
        body.put_slice(CRLF);
    }
    body.put_slice(format!("--{BOUNDARY}--").as_bytes());
    body.put_slice(CRLF);

    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    (content_type, body.freeze())
}

// Best-effort guess from the filename extension; the upload endpoint only
// needs something plausible here.
fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        _ => "application/octet-stream",
    }
}
