/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # Flickr
//!
//! This library was created for working with the Flickr REST interface.
//!
//! For further details on the Rest API refer to the [Flickr API Docs](https://www.flickr.com/services/api/)
//!
//! ## Features
//!
//! - Calling any REST method with shared-secret or OAuth1 request signing
//! - Exponential-backoff retry of transient network failures
//! - Optional pluggable response caching
//! - Photo upload/replace over multipart/form-data
//! - Asynchronous upload tracking via ticket polling
//!
//! *The Flickr upload API uses OAuth1. This library handles the request
//! signing. Getting the Access Token/Secret is left up to the consumer of
//! this library*
//!
//! *This crate does not enumerate the Flickr method catalogue. Every method
//! is reachable through [`rest::Client::call`] with the method name and its
//! arguments; responses come back as cleaned-up JSON values*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! flickr = "0.4.0"
//! ```
//!
//! ## Usage
//!
//! **You will need to acquire an API key/secret from Flickr prior to using the API**
//!
//! ```rust,no_run
//! use flickr::rest::{ApiCall, Client, Creds};
//!
//! async fn list_public_photos(api_key: &str, api_secret: &str, user_id: &str) -> anyhow::Result<()> {
//!     // The API key/secret is obtained from your Flickr account
//!     let client = Client::new(Creds::from_keys(api_key, api_secret));
//!
//!     let resp = client
//!         .call(
//!             ApiCall::new("flickr.people.getPublicPhotos")
//!                 .arg("user_id", user_id)
//!                 .arg("per_page", 10),
//!         )
//!         .await?;
//!
//!     for photo in resp["photos"]["photo"].as_array().into_iter().flatten() {
//!         println!("{} {}", photo["id"], photo["title"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
pub mod rest;
