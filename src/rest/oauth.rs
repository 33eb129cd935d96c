/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::client::{AuthHandler, Creds};
use crate::rest::errors::FlickrError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand::RngExt;
use rand::distr::Alphanumeric;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 16;

/// OAuth 1.0a request signing with a previously obtained access token.
///
/// Completes request parameters with the oauth_* set and an HMAC-SHA1
/// signature. Obtaining the access token/secret is an external concern.
pub struct OauthHandler {
    creds: Creds,
    access_token: String,
    token_secret: String,
}

impl OauthHandler {
    pub fn new(creds: Creds, access_token: &str, token_secret: &str) -> Self {
        Self {
            creds,
            access_token: access_token.to_string(),
            token_secret: token_secret.to_string(),
        }
    }

    fn signature(&self, base_string: &str) -> Result<String, FlickrError> {
        let key = format!(
            "{}&{}",
            percent_encode(self.creds.api_secret()),
            percent_encode(&self.token_secret)
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|_| FlickrError::AuthConfiguration("invalid signing key".into()))?;
        mac.update(base_string.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for OauthHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthHandler")
            .field("creds", &self.creds)
            .field("access_token", &"xxx")
            .field("token_secret", &"xxx")
            .finish()
    }
}

impl AuthHandler for OauthHandler {
    fn creds(&self) -> Creds {
        self.creds.clone()
    }

    fn complete_parameters(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Vec<(String, String)>, FlickrError> {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut completed = params.to_vec();
        completed.push(("oauth_nonce".to_string(), nonce));
        completed.push(("oauth_timestamp".to_string(), timestamp));
        completed.push((
            "oauth_consumer_key".to_string(),
            self.creds.api_key().to_string(),
        ));
        completed.push((
            "oauth_signature_method".to_string(),
            SIGNATURE_METHOD.to_string(),
        ));
        completed.push(("oauth_version".to_string(), OAUTH_VERSION.to_string()));
        completed.push(("oauth_token".to_string(), self.access_token.clone()));

        let base_string = signature_base_string("POST", url, &completed);
        let signature = self.signature(&base_string)?;
        completed.push(("oauth_signature".to_string(), signature));
        Ok(completed)
    }
}

// RFC 3986 percent-encoding as OAuth requires it.
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn signature_base_string(http_method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        http_method,
        percent_encode(url),
        percent_encode(&normalized)
    )
}
