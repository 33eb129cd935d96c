/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::cache::ResponseCache;
use crate::rest::errors::FlickrError;
use crate::rest::normalize::clean_content;
use crate::rest::transport::{RetryPolicy, send_request};
use crate::rest::upload::{REPLACE_URL, UPLOAD_URL};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Root of the Flickr REST interface.
pub const REST_URL: &str = "https://api.flickr.com/services/rest/";

/// API key/secret pair used to sign requests.
///
/// Deserializable so keys can be read from a token cache file.
#[derive(Default, Clone, serde::Deserialize)]
pub struct Creds {
    api_key: String,
    api_secret: String,
}

impl Creds {
    pub fn from_keys(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    fn is_set(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl std::fmt::Debug for Creds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creds")
            .field("api_key", &"xxx")
            .field("api_secret", &"xxx")
            .finish()
    }
}

/// Completes request parameters for a delegated authentication scheme.
///
/// Handlers own the credential material and add whatever parameters the
/// scheme requires, signature included. The completed set is form-encoded for
/// REST calls and carried as form fields for multipart uploads, which is why
/// this returns parameters rather than an encoded body.
pub trait AuthHandler: Send + Sync {
    /// Key/secret backing this handler.
    fn creds(&self) -> Creds;

    /// Returns `params` extended with the scheme's authentication parameters
    /// for a request to `url`.
    fn complete_parameters(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Vec<(String, String)>, FlickrError>;
}

/// How a request gets authenticated.
#[derive(Clone, Default)]
pub enum SigningMode {
    /// Only the api_key argument is sent.
    #[default]
    Unsigned,
    /// An `api_sig` MD5 digest over the sorted arguments is appended.
    SharedSecret,
    /// Request completion is handed to an [`AuthHandler`].
    Delegated(Arc<dyn AuthHandler>),
}

impl std::fmt::Debug for SigningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMode::Unsigned => f.write_str("Unsigned"),
            SigningMode::SharedSecret => f.write_str("SharedSecret"),
            SigningMode::Delegated(_) => f.write_str("Delegated"),
        }
    }
}

/// Argument value for an [`ApiCall`].
///
/// The wire protocol has no boolean type; booleans encode as "0"/"1".
#[derive(Debug, Clone)]
pub struct ArgValue(String);

impl ArgValue {
    fn into_string(self) -> String {
        self.0
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self(u8::from(v).to_string())
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self(v.to_string())
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        Self(v.to_string())
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

/// One invocation of a REST method.
///
/// Arguments keep their insertion order and keys stay unique; setting a key a
/// second time replaces its value.
#[derive(Debug, Clone, Default)]
pub struct ApiCall {
    method: String,
    args: Vec<(String, String)>,
    signing: Option<SigningMode>,
    creds: Option<Creds>,
}

impl ApiCall {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            ..Default::default()
        }
    }

    /// Sets a method argument, replacing any previous value for the key.
    pub fn arg(mut self, key: &str, value: impl Into<ArgValue>) -> Self {
        let value = value.into().into_string();
        match self.args.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.args.push((key.to_string(), value)),
        }
        self
    }

    /// Requests a shared-secret `api_sig` signature for this call.
    pub fn signed(mut self) -> Self {
        self.signing = Some(SigningMode::SharedSecret);
        self
    }

    /// Overrides the client signing mode for this call.
    pub fn signing(mut self, signing: SigningMode) -> Self {
        self.signing = Some(signing);
        self
    }

    /// Overrides the client credentials for this call.
    pub fn creds(mut self, creds: Creds) -> Self {
        self.creds = Some(creds);
        self
    }
}

struct ClientInner {
    https_client: reqwest::Client,
    creds: Option<Creds>,
    signing: SigningMode,
    cache: Option<Arc<dyn ResponseCache>>,
    retry: RetryPolicy,
    rest_url: String,
    upload_url: String,
    replace_url: String,
}

/// Performs the calls to the Flickr REST interface.
///
/// Cheap to clone; clones share the underlying transport, cache and
/// configuration.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Creates a client with default configuration from provided tokens.
    pub fn new(creds: Creds) -> Self {
        Self::builder().creds(creds).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub(crate) fn https_client(&self) -> &reqwest::Client {
        &self.inner.https_client
    }

    pub(crate) fn auth_handler(&self) -> Option<Arc<dyn AuthHandler>> {
        match &self.inner.signing {
            SigningMode::Delegated(handler) => Some(handler.clone()),
            _ => None,
        }
    }

    pub(crate) fn upload_url(&self) -> &str {
        &self.inner.upload_url
    }

    pub(crate) fn replace_url(&self) -> &str {
        &self.inner.replace_url
    }

    /// Calls a REST method and returns the cleaned-up JSON response.
    ///
    /// Fails with [`FlickrError::ApiResponse`] when the server reports a
    /// non-ok status and [`FlickrError::Protocol`] when the body is not the
    /// expected wire format.
    pub async fn call(&self, call: ApiCall) -> Result<Value, FlickrError> {
        let body = self.execute(call, false).await?;
        let resp: Value = serde_json::from_slice(&body)?;
        if resp["stat"] != "ok" {
            let code = resp["code"].as_u64().unwrap_or(0) as u32;
            let message = resp["message"].as_str().unwrap_or_default().to_string();
            return Err(FlickrError::ApiResponse(code, message));
        }
        Ok(clean_content(resp))
    }

    /// Calls a REST method and returns the response body untouched, in the
    /// server's default response format.
    pub async fn call_raw(&self, call: ApiCall) -> Result<Bytes, FlickrError> {
        self.execute(call, true).await
    }

    async fn execute(&self, call: ApiCall, raw: bool) -> Result<Bytes, FlickrError> {
        let signing = call.signing.unwrap_or_else(|| self.inner.signing.clone());

        let creds = call
            .creds
            .or_else(|| match &signing {
                SigningMode::Delegated(handler) => Some(handler.creds()),
                _ => None,
            })
            .or_else(|| self.inner.creds.clone())
            .filter(Creds::is_set)
            .ok_or_else(|| {
                FlickrError::AuthConfiguration("The Flickr API keys have not been set".into())
            })?;

        let mut args = call.args;
        args.push(("method".to_string(), call.method));
        args.push(("api_key".to_string(), creds.api_key().to_string()));
        if !raw {
            args.push(("format".to_string(), "json".to_string()));
            args.push(("nojsoncallback".to_string(), "1".to_string()));
        }

        let body = match &signing {
            SigningMode::Unsigned => form_encode(&args),
            SigningMode::SharedSecret => {
                let sig = sign_args(creds.api_secret(), &args);
                args.push(("api_sig".to_string(), sig));
                form_encode(&args)
            }
            SigningMode::Delegated(handler) => {
                let completed = handler.complete_parameters(&self.inner.rest_url, &args)?;
                form_encode(&completed)
            }
        };

        match &self.inner.cache {
            None => {
                send_request(
                    &self.inner.https_client,
                    &self.inner.rest_url,
                    Some(&body),
                    self.inner.retry,
                )
                .await
            }
            Some(cache) => {
                let resp = match cache.get(&body) {
                    Some(hit) => hit,
                    None => {
                        send_request(
                            &self.inner.https_client,
                            &self.inner.rest_url,
                            Some(&body),
                            self.inner.retry,
                        )
                        .await?
                    }
                };
                if !cache.contains(&body) {
                    cache.set(&body, resp.clone());
                }
                Ok(resp)
            }
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("signing", &self.inner.signing)
            .field("rest_url", &self.inner.rest_url)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    https_client: Option<reqwest::Client>,
    creds: Option<Creds>,
    signing: SigningMode,
    cache: Option<Arc<dyn ResponseCache>>,
    retry: RetryPolicy,
    rest_url: String,
    upload_url: String,
    replace_url: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            https_client: None,
            creds: None,
            signing: SigningMode::Unsigned,
            cache: None,
            retry: RetryPolicy::default(),
            rest_url: REST_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
            replace_url: REPLACE_URL.to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn creds(mut self, creds: Creds) -> Self {
        self.creds = Some(creds);
        self
    }

    /// Routes every call through `handler` unless a call overrides its
    /// signing mode.
    pub fn auth_handler(mut self, handler: Arc<dyn AuthHandler>) -> Self {
        self.signing = SigningMode::Delegated(handler);
        self
    }

    pub fn signing(mut self, signing: SigningMode) -> Self {
        self.signing = signing;
        self
    }

    /// Installs a response cache consulted before every network call.
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Initial retry backoff wait. Defaults to 500ms.
    pub fn starting_timeout(mut self, timeout: Duration) -> Self {
        self.retry.starting_timeout = timeout;
        self
    }

    /// Total retry budget. Defaults to zero, which disables retrying.
    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.retry.max_timeout = timeout;
        self
    }

    /// Substitutes the underlying HTTP transport.
    pub fn https_client(mut self, https_client: reqwest::Client) -> Self {
        self.https_client = Some(https_client);
        self
    }

    /// Points the client at a different REST endpoint.
    pub fn rest_url(mut self, url: &str) -> Self {
        self.rest_url = url.to_string();
        self
    }

    /// Points the client at a different upload endpoint.
    pub fn upload_url(mut self, url: &str) -> Self {
        self.upload_url = url.to_string();
        self
    }

    /// Points the client at a different replace endpoint.
    pub fn replace_url(mut self, url: &str) -> Self {
        self.replace_url = url.to_string();
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                https_client: self.https_client.unwrap_or_default(),
                creds: self.creds,
                signing: self.signing,
                cache: self.cache,
                retry: self.retry,
                rest_url: self.rest_url,
                upload_url: self.upload_url,
                replace_url: self.replace_url,
            }),
        }
    }
}

fn form_encode(args: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(args.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

// Shared-secret signature: MD5 over the secret followed by the argument
// pairs concatenated in lexicographic key-byte order.
fn sign_args(secret: &str, args: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = args.iter().collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    let mut payload = String::from(secret);
    for (k, v) in sorted {
        payload.push_str(k);
        payload.push_str(v);
    }
    format!("{:x}", md5::compute(payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_replaces_existing_key_keeping_order() {
        let call = ApiCall::new("flickr.test.echo")
            .arg("a", "1")
            .arg("b", "2")
            .arg("a", "3");
        assert_eq!(
            call.args,
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn bool_args_encode_as_integers() {
        let call = ApiCall::new("m").arg("is_public", true).arg("is_friend", false);
        assert_eq!(call.args[0].1, "1");
        assert_eq!(call.args[1].1, "0");
    }

    #[test]
    fn signature_ignores_argument_insertion_order() {
        let forward = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        let reversed = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        assert_eq!(sign_args("secret", &forward), sign_args("secret", &reversed));
    }

    #[test]
    fn signature_is_a_stable_md5_hex_digest() {
        let args = vec![("a".to_string(), "1".to_string())];
        let sig = sign_args("secret", &args);
        assert_eq!(sig.len(), 32);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sign_args("secret", &args));
        assert_ne!(sig, sign_args("other", &args));
    }

    #[test]
    fn redacts_credentials_in_debug_output() {
        let creds = Creds::from_keys("a-key-value", "a-secret-value");
        let out = format!("{:?}", creds);
        assert!(!out.contains("a-key-value"));
        assert!(!out.contains("a-secret-value"));
        assert!(out.contains("xxx"));
    }
}
