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

//! Implements zone building from the configuration file.

use std::fmt::Write;

use anyhow::{Context, Result};
use log::error;

use burrow::module::Module;
use burrow::name::Name;
use burrow::rr::{Rdata, Soa, Ttl, Type};
use burrow::zone::{Leaf, Node, StaticEntry, Zone};

use crate::config::{FileConfig, RecordConfig, ZoneConfig};

/// Builds the module set from the zones defined in `config`. A zone
/// that fails to build is skipped with a diagnostic; the rest of the
/// set still loads.
pub fn from_config(config: &FileConfig) -> Vec<Module> {
    let mut modules = Vec::new();
    for (name, zone_config) in &config.zones {
        match build_zone(name, zone_config) {
            Ok(zone) => modules.push(Module::Zone(zone)),
            Err(e) => {
                let mut message = format!("Failed to load zone {}:", name);
                for (i, cause) in e.chain().enumerate() {
                    write!(message, "\n[{}] {}", i + 1, cause).unwrap();
                }
                error!("{}", message);
            }
        }
    }
    modules
}

/// Builds a single zone.
fn build_zone(name: &str, config: &ZoneConfig) -> Result<Zone> {
    let name: Name = name.parse().context("invalid zone name")?;
    let mut tree = Node::new();
    for record in &config.records {
        apply_record(&mut tree, record).with_context(|| {
            format!(
                "bad record at {}",
                record.name.as_deref().unwrap_or("the apex"),
            )
        })?;
    }
    let soa = Soa {
        mname: config.soa.mname.parse().context("invalid SOA mname")?,
        rname: config.soa.rname.parse().context("invalid SOA rname")?,
        serial: config.soa.serial,
        refresh: Ttl::from(config.soa.refresh),
        retry: Ttl::from(config.soa.retry),
        expire: Ttl::from(config.soa.expire),
        minimum: Ttl::from(config.soa.minimum),
    };
    Zone::new(name, tree, soa).map_err(Into::into)
}

/// Compiles one record entry into leaves on the named tree node.
fn apply_record(tree: &mut Node, record: &RecordConfig) -> Result<()> {
    let node = target_node(tree, record.name.as_deref());
    let ttl = record.ttl.map(Ttl::from);

    if let Some(destination) = &record.cname {
        let destination: Name = destination.parse().context("invalid CNAME destination")?;
        node.set_record(Type::ANY, Leaf::Cname(destination));
    }
    if let Some(destination) = &record.redirect {
        let destination: Name = destination.parse().context("invalid redirect destination")?;
        node.set_record(Type::ANY, Leaf::Redirect(destination));
    }
    if !record.a.is_empty() {
        let entries = record.a.iter().map(|ip| entry(Rdata::A(*ip), ttl)).collect();
        node.set_record(Type::A, Leaf::Static(entries));
    }
    if !record.aaaa.is_empty() {
        let entries = record
            .aaaa
            .iter()
            .map(|ip| entry(Rdata::Aaaa(*ip), ttl))
            .collect();
        node.set_record(Type::AAAA, Leaf::Static(entries));
    }
    if !record.txt.is_empty() {
        let entries = record
            .txt
            .iter()
            .map(|text| entry(Rdata::Txt(text.clone()), ttl))
            .collect();
        node.set_record(Type::TXT, Leaf::Static(entries));
    }
    Ok(())
}

fn entry(data: Rdata, ttl: Option<Ttl>) -> StaticEntry {
    let entry = StaticEntry::new(data);
    match ttl {
        Some(ttl) => entry.with_ttl(ttl),
        None => entry,
    }
}

/// Walks (creating as needed) to the node for a label path relative
/// to the apex. `None` and `"@"` name the apex itself.
fn target_node<'a>(tree: &'a mut Node, path: Option<&str>) -> &'a mut Node {
    match path {
        None | Some("@") => tree,
        Some(path) => {
            let mut node = tree;
            for label in path.rsplit('.') {
                node = node.child_mut(label);
            }
            node
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use burrow::class::Class;
    use burrow::config::Config;
    use burrow::engine::Engine;
    use burrow::message::{Message, Question, Rcode};
    use burrow::module::{BoxError, Module};
    use burrow::rr::{Rdata, Type};

    use super::from_config;
    use crate::config::FileConfig;

    const EXAMPLE: &str = r#"
        bind = "127.0.0.1:53530"

        [zones."example.com"]
        soa = { mname = "ns1.example.com", rname = "hostmaster.example.com", serial = 1, refresh = 300, retry = 600, expire = 86400, minimum = 3600 }

        [[zones."example.com".records]]
        name = "www"
        a = ["91.92.144.105"]

        [[zones."example.com".records]]
        name = "google"
        cname = "www.google.com"

        [zones."bad.example"]
        soa = { mname = "ns1.bad.example", rname = "hostmaster.bad.example", serial = 1, refresh = 3600, retry = 600, expire = 86400, minimum = 60 }
    "#;

    fn engine_from(toml_text: &'static str) -> Engine {
        let engine = Engine::new(Config::default(), move || -> Result<Vec<Module>, BoxError> {
            let config: FileConfig =
                toml::from_str(toml_text).map_err(|e| -> BoxError { e.to_string().into() })?;
            Ok(from_config(&config))
        });
        engine.reload().unwrap();
        engine
    }

    #[test]
    fn skips_invalid_zones_and_keeps_the_rest() {
        // bad.example violates the SOA minimum/refresh invariant, so
        // only example.com loads.
        let config: FileConfig = toml::from_str(EXAMPLE).unwrap();
        let modules = from_config(&config);
        assert_eq!(modules.len(), 1);
        assert_eq!(
            modules[0].name().map(|n| n.as_str().to_owned()),
            Some("example.com".to_owned()),
        );
    }

    #[test]
    fn configured_zones_answer_queries() {
        let engine = engine_from(EXAMPLE);
        let query = Message::query(
            1,
            vec![Question {
                name: "www.example.com".parse().unwrap(),
                qtype: Type::A,
                qclass: Class::IN,
            }],
        );
        let response = engine.answer(&query);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(
            response.answers[0].data,
            Rdata::A("91.92.144.105".parse().unwrap()),
        );
    }
}
