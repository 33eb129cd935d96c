/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::client::Client;
use crate::rest::errors::FlickrError;
use crate::rest::multipart::{FilePart, encode_multipart_formdata};
use crate::rest::tickets::TicketTracker;
use bytes::Bytes;
use log::error;
use num_enum::IntoPrimitive;

/// Upload endpoint. Answers XML rather than the REST interface's JSON.
pub const UPLOAD_URL: &str = "https://api.flickr.com/services/upload/";

/// Replace endpoint, for swapping the bytes of an existing photo.
pub const REPLACE_URL: &str = "https://api.flickr.com/services/replace/";

#[derive(Debug, Clone, Copy, IntoPrimitive)]
#[repr(u8)]
pub enum SafetyLevel {
    Safe = 1,
    Moderate = 2,
    Restricted = 3,
}

#[derive(Debug, Clone, Copy, IntoPrimitive)]
#[repr(u8)]
pub enum ContentKind {
    Photo = 1,
    Screenshot = 2,
    Other = 3,
}

#[derive(Debug, Clone, Copy, IntoPrimitive)]
#[repr(u8)]
pub enum HiddenMode {
    Searchable = 1,
    Hidden = 2,
}

/// Options accepted by the upload endpoint.
///
/// The endpoint requires authentication with write permission; uploads go
/// through the client's delegated auth handler.
#[derive(Debug, Clone, Default)]
pub struct UploadParams {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Space-separated list of tags to apply to the photo.
    pub tags: Option<String>,
    pub is_public: Option<bool>,
    pub is_friend: Option<bool>,
    pub is_family: Option<bool>,
    pub safety_level: Option<SafetyLevel>,
    pub content_type: Option<ContentKind>,
    pub hidden: Option<HiddenMode>,
    /// When set the server answers with a ticket id immediately and finishes
    /// the job in the background.
    pub asynchronous: bool,
}

impl UploadParams {
    pub(crate) fn to_args(&self) -> Vec<(String, String)> {
        let mut args: Vec<(String, String)> = Vec::new();
        let mut push = |k: &str, v: String| args.push((k.to_string(), v));
        if let Some(v) = &self.title {
            push("title", v.clone());
        }
        if let Some(v) = &self.description {
            push("description", v.clone());
        }
        if let Some(v) = &self.tags {
            push("tags", v.clone());
        }
        if let Some(v) = self.is_public {
            push("is_public", u8::from(v).to_string());
        }
        if let Some(v) = self.is_friend {
            push("is_friend", u8::from(v).to_string());
        }
        if let Some(v) = self.is_family {
            push("is_family", u8::from(v).to_string());
        }
        if let Some(v) = self.safety_level {
            push("safety_level", u8::from(v).to_string());
        }
        if let Some(v) = self.content_type {
            push("content_type", u8::from(v).to_string());
        }
        if let Some(v) = self.hidden {
            push("hidden", u8::from(v).to_string());
        }
        push("async", u8::from(self.asynchronous).to_string());
        args
    }
}

/// Options accepted by the replace endpoint.
#[derive(Debug, Clone)]
pub struct ReplaceParams {
    /// The photo whose bytes are being replaced.
    pub photo_id: String,
    pub asynchronous: bool,
}

impl ReplaceParams {
    pub fn new(photo_id: &str) -> Self {
        Self {
            photo_id: photo_id.to_string(),
            asynchronous: false,
        }
    }

    fn to_args(&self) -> Vec<(String, String)> {
        vec![
            ("photo_id".to_string(), self.photo_id.clone()),
            ("async".to_string(), u8::from(self.asynchronous).to_string()),
        ]
    }
}

/// What the upload endpoints answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadReply {
    /// Synchronous mode: the photo id of the finished upload.
    Photo(String),
    /// Asynchronous mode: a ticket to poll for completion, e.g. through a
    /// [`TicketTracker`].
    Ticket(String),
}

impl Client {
    /// Uploads a photo.
    ///
    /// Requires a delegated auth handler with write permission. In
    /// asynchronous mode the server answers [`UploadReply::Ticket`] and the
    /// job completes in the background; see [`TicketTracker`] or
    /// [`Client::upload_and_track`].
    pub async fn upload(
        &self,
        filename: &str,
        data: Bytes,
        params: &UploadParams,
    ) -> Result<UploadReply, FlickrError> {
        self.post_file(self.upload_url(), filename, data, params.to_args())
            .await
    }

    /// Replaces the bytes of an existing photo.
    pub async fn replace(
        &self,
        filename: &str,
        data: Bytes,
        params: &ReplaceParams,
    ) -> Result<UploadReply, FlickrError> {
        self.post_file(self.replace_url(), filename, data, params.to_args())
            .await
    }

    /// Uploads a photo and waits until the server-side job completes.
    ///
    /// Synchronous replies yield the photo id directly. Ticket replies are
    /// registered with `tracker` and awaited; the ticket id is returned once
    /// the job succeeds.
    pub async fn upload_and_track(
        &self,
        tracker: &TicketTracker,
        filename: &str,
        data: Bytes,
        params: &UploadParams,
    ) -> Result<String, FlickrError> {
        match self.upload(filename, data, params).await? {
            UploadReply::Photo(id) => Ok(id),
            UploadReply::Ticket(id) => {
                tracker.submit(&id).await?;
                Ok(id)
            }
        }
    }

    async fn post_file(
        &self,
        url: &str,
        filename: &str,
        data: Bytes,
        mut args: Vec<(String, String)>,
    ) -> Result<UploadReply, FlickrError> {
        let handler = self.auth_handler().ok_or_else(|| {
            FlickrError::AuthConfiguration("Uploading requires an authentication handler".into())
        })?;

        args.push(("api_key".to_string(), handler.creds().api_key().to_string()));
        let fields = handler.complete_parameters(url, &args)?;

        let files = [FilePart::new("photo", filename, data)];
        let (content_type, body) = encode_multipart_formdata(&fields, &files);

        // Uploads are not replayed through the retry executor; a failed
        // transfer surfaces directly.
        let resp = self
            .https_client()
            .post(url)
            .header("Content-Type", content_type)
            .header("Content-Length", body.len().to_string())
            .body(body)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|_| error!("Failed to upload {filename}"))?;

        let body = resp.text().await?;
        parse_rsp(&body)
    }
}

// The upload endpoints answer a minimal XML document:
//   <rsp stat="ok"><photoid>1234</photoid></rsp>
//   <rsp stat="ok"><ticketid>363</ticketid></rsp>
//   <rsp stat="fail"><err code="3" msg="..."/></rsp>
fn parse_rsp(body: &str) -> Result<UploadReply, FlickrError> {
    let rsp = element(body, "rsp")
        .ok_or_else(|| FlickrError::UploadResponseMalformed(body.to_string()))?;

    match attr(rsp.attrs, "stat").as_deref() {
        Some("ok") => {}
        Some("fail") => {
            let err = element(rsp.content, "err")
                .ok_or_else(|| FlickrError::UploadResponseMalformed(body.to_string()))?;
            let code = attr(err.attrs, "code")
                .and_then(|c| c.parse::<u32>().ok())
                .unwrap_or(0);
            let msg = attr(err.attrs, "msg").unwrap_or_default();
            return Err(FlickrError::ApiResponse(code, msg));
        }
        _ => return Err(FlickrError::UploadResponseMalformed(body.to_string())),
    }

    if let Some(photoid) = element(rsp.content, "photoid") {
        return Ok(UploadReply::Photo(photoid.content.trim().to_string()));
    }
    if let Some(ticketid) = element(rsp.content, "ticketid") {
        return Ok(UploadReply::Ticket(ticketid.content.trim().to_string()));
    }
    Err(FlickrError::UploadResponseMalformed(body.to_string()))
}

struct Element<'a> {
    attrs: &'a str,
    content: &'a str,
}

// Locates `<name ...>...</name>` or a self-closing `<name .../>` and hands
// back its attribute region and inner text. Enough for the fixed rsp format;
// not a general XML parser.
fn element<'a>(xml: &'a str, name: &str) -> Option<Element<'a>> {
    let open = format!("<{name}");
    let start = xml.find(&open)?;
    let after_name = &xml[start + open.len()..];
    // Reject partial tag-name matches such as <rspx>
    match after_name.chars().next() {
        Some(c) if c == ' ' || c == '>' || c == '/' || c == '\t' || c == '\n' => {}
        _ => return None,
    }
    let tag_end = after_name.find('>')?;
    let tag_body = &after_name[..tag_end];
    if let Some(attrs) = tag_body.strip_suffix('/') {
        return Some(Element {
            attrs: attrs.trim(),
            content: "",
        });
    }
    let rest = &after_name[tag_end + 1..];
    let close = format!("</{name}>");
    let content_end = rest.find(&close)?;
    Some(Element {
        attrs: tag_body.trim(),
        content: &rest[..content_end],
    })
}

// Pulls `name="value"` out of an attribute region.
fn attr(attrs: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=\"");
    let start = attrs.find(&marker)? + marker.len();
    let rest = &attrs[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}
