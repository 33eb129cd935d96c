/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

pub mod cache;
pub mod client;
pub mod errors;
pub mod multipart;
pub mod normalize;
pub mod oauth;
pub mod tickets;
pub mod transport;
pub mod upload;

pub use cache::*;
pub use client::*;
pub use errors::*;
pub use multipart::*;
pub use normalize::*;
pub use oauth::*;
pub use tickets::*;
pub use transport::*;
pub use upload::*;
