// Copyright 2023 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the engine configuration and its supply boundary.

use std::net::{Ipv4Addr, SocketAddr};

use serde::Deserialize;

use crate::module::BoxError;

/// The engine configuration.
///
/// `max_redirects` bounds CNAME/internal-redirect chasing within a
/// question; it is the only cancellation mechanism for runaway rewrite
/// chains. `debug` gates the synthetic-TXT diagnostics emitted for
/// failed questions; those leak internal failure detail into
/// responses, so the default is off. `bind` is carried for the host's
/// transport and never read by the engine itself.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: SocketAddr,
    pub max_redirects: u32,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 53530)),
            max_redirects: 10,
            debug: false,
        }
    }
}

/// The boundary through which host code supplies configuration.
///
/// `fetch` is called on every engine reload and must re-read the
/// underlying source, so that reloading picks up external changes.
pub trait ConfigSource: Send + Sync {
    fn fetch(&self) -> Result<Config, BoxError>;
}

/// A fixed configuration is its own (reload-invariant) source.
impl ConfigSource for Config {
    fn fetch(&self) -> Result<Config, BoxError> {
        Ok(self.clone())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
