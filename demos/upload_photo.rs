/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

extern crate flickr;

use anyhow::Result;
use bytes::Bytes;
use dotenvy::dotenv;
use flickr::rest::{
    Client, ContentKind, Creds, OauthHandler, SafetyLevel, TicketTracker, UploadParams,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

// Oauth tokens stored in cache json file
#[derive(Deserialize, Debug)]
struct FlickrOauth1Token {
    token: String,
    secret: String,
}

// Retrieves the auth tokens.
fn get_flickr_tokens(path: PathBuf) -> Result<FlickrOauth1Token> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

fn get_auth_handler() -> Result<OauthHandler> {
    let api_key = std::env::var("FLICKR_API_KEY")?;
    let api_secret = std::env::var("FLICKR_API_SECRET")?;
    let token_cache = std::env::var("FLICKR_AUTH_CACHE")?;
    let tokens = get_flickr_tokens(token_cache.into())?;

    Ok(OauthHandler::new(
        Creds::from_keys(&api_key, &api_secret),
        &tokens.token,
        &tokens.secret,
    ))
}

// main
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: upload_photo <photo file>"))?;

    // The Access Token/Secret is obtained via the OAuth1 authentication
    // process; uploading requires write permission.
    let client = Client::builder()
        .auth_handler(Arc::new(get_auth_handler()?))
        .build();

    let data = Bytes::from(std::fs::read(&path)?);
    let filename = PathBuf::from(&path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(path.clone());

    let params = UploadParams {
        title: Some("test1".to_string()),
        is_public: Some(false),
        is_friend: Some(false),
        is_family: Some(false),
        safety_level: Some(SafetyLevel::Safe),
        content_type: Some(ContentKind::Photo),
        asynchronous: true,
        ..Default::default()
    };

    // In asynchronous mode the server answers with a ticket; the tracker
    // polls until the job finishes.
    let tracker = TicketTracker::new(Arc::new(client.clone()));
    let id = client
        .upload_and_track(&tracker, &filename, data, &params)
        .await?;

    println!(
        "Upload complete: https://www.flickr.com/photos/upload/edit/?ids={id}"
    );
    Ok(())
}
