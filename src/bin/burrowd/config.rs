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

//! Implements the daemon configuration file.
//!
//! One TOML file carries both the engine settings and the declarative
//! zone definitions. [`FileSource`] re-reads it on every engine
//! reload, which is what makes SIGHUP pick up changes.

use std::collections::BTreeMap;
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use burrow::config::{Config, ConfigSource};
use burrow::module::{BoxError, Module, ModuleProvider};

use crate::zones;

////////////////////////////////////////////////////////////////////////
// CONFIGURATION FILE MODEL                                           //
////////////////////////////////////////////////////////////////////////

/// The daemon configuration file.
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub bind: Option<SocketAddr>,
    #[serde(default)]
    pub max_redirects: Option<u32>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub zones: BTreeMap<String, ZoneConfig>,
}

impl FileConfig {
    /// Loads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!(
            "Configuration loaded: {} zone(s) defined.",
            config.zones.len(),
        );
        Ok(config)
    }

    /// Produces the engine configuration, with settings missing from
    /// the file filled in from the defaults and the bind address
    /// optionally overridden from the command line.
    pub fn engine_config(&self, bind_override: Option<SocketAddr>) -> Config {
        let defaults = Config::default();
        Config {
            bind: bind_override.or(self.bind).unwrap_or(defaults.bind),
            max_redirects: self.max_redirects.unwrap_or(defaults.max_redirects),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}

/// One zone definition: SOA fields plus record entries.
#[derive(Debug, Deserialize)]
pub struct ZoneConfig {
    pub soa: SoaConfig,
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

/// The SOA fields of a zone definition.
#[derive(Debug, Deserialize)]
pub struct SoaConfig {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// One record entry of a zone definition.
///
/// `name` is the label path relative to the zone apex (`"www"`,
/// `"mail.internal"`, `"*"` for a wildcard); omitted or `"@"` means
/// the apex itself. The remaining fields each contribute a leaf to
/// the named node.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub a: Vec<Ipv4Addr>,
    #[serde(default)]
    pub aaaa: Vec<Ipv6Addr>,
    #[serde(default)]
    pub txt: Vec<String>,
    #[serde(default)]
    pub cname: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

////////////////////////////////////////////////////////////////////////
// SUPPLY BOUNDARIES                                                  //
////////////////////////////////////////////////////////////////////////

/// The engine's configuration and module supply, backed by the
/// configuration file. Each fetch re-reads the file.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    bind_override: Option<SocketAddr>,
}

impl FileSource {
    pub fn new(path: PathBuf, bind_override: Option<SocketAddr>) -> Self {
        Self {
            path,
            bind_override,
        }
    }
}

impl ConfigSource for FileSource {
    fn fetch(&self) -> Result<Config, BoxError> {
        let file = FileConfig::load(&self.path).map_err(to_box_error)?;
        Ok(file.engine_config(self.bind_override))
    }
}

impl ModuleProvider for FileSource {
    fn modules(&self) -> Result<Vec<Module>, BoxError> {
        let file = FileConfig::load(&self.path).map_err(to_box_error)?;
        Ok(zones::from_config(&file))
    }
}

/// Flattens an [`anyhow::Error`] chain into the library's boxed-error
/// form.
fn to_box_error(error: anyhow::Error) -> BoxError {
    format!("{:#}", error).into()
}
