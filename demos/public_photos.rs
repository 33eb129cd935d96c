/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

extern crate flickr;

use anyhow::Result;
use dotenvy::dotenv;
use flickr::rest::{ApiCall, Client, Creds, SimpleCache};
use std::sync::Arc;
use std::time::Duration;

// Look up a user's NSID from their username.
async fn find_user_id(client: &Client, username: &str) -> Result<String> {
    let resp = client
        .call(ApiCall::new("flickr.people.findByUsername").arg("username", username))
        .await?;
    let id = resp["user"]["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no user id in response"))?
        .to_string();
    Ok(id)
}

// List the user's public photosets. The second listing is served out of the
// response cache without touching the network.
async fn list_photosets(client: &Client, user_id: &str) -> Result<()> {
    let resp = client
        .call(ApiCall::new("flickr.photosets.getList").arg("user_id", user_id))
        .await?;

    for (i, set) in resp["photosets"]["photoset"]
        .as_array()
        .into_iter()
        .flatten()
        .enumerate()
    {
        println!("{} {}", i, set["title"]);
    }
    Ok(())
}

// main
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let username = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: public_photos <username>"))?;

    // The API key/secret is obtained from your Flickr account.
    let api_key = std::env::var("FLICKR_API_KEY")?;
    let api_secret = std::env::var("FLICKR_API_SECRET")?;

    let client = Client::builder()
        .creds(Creds::from_keys(&api_key, &api_secret))
        .cache(Arc::new(SimpleCache::new()))
        .max_timeout(Duration::from_secs(10))
        .build();

    let user_id = find_user_id(&client, &username).await?;
    println!("Found user: {user_id}");

    list_photosets(&client, &user_id).await?;

    // Served from the cache.
    list_photosets(&client, &user_id).await?;
    Ok(())
}
