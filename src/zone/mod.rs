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

//! Implementation of zones and their resolving trees.
//!
//! A [`Zone`] is the module variant that answers questions for a
//! domain suffix. It owns a tree of [`Node`]s keyed by reversed domain
//! labels; each node may carry per-record-type [`Leaf`] entries (with
//! [`Type::ANY`] as a catch-all key), may itself be a terminal leaf,
//! and may have children, including the wildcard child `*` that
//! matches any remaining labels. A leaf describes how to answer:
//! static record data, a CNAME, an internal redirect, a dynamic
//! handler, or delegation onward along the resolver chain.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::class::Class;
use crate::engine::{Context, ProcessingError, ProcessingResult};
use crate::module::{Handler, UnloadHook};
use crate::name::Name;
use crate::rr::{Rdata, Record, Soa, Ttl, Type};

pub mod build;
mod error;
mod lookup;
pub use error::Error;

////////////////////////////////////////////////////////////////////////
// ZONES                                                              //
////////////////////////////////////////////////////////////////////////

/// A zone: a resolving tree plus SOA authority data for one domain
/// suffix.
///
/// Construction validates the authority data: the SOA `minimum` TTL
/// must not be less than the `refresh` interval, since `refresh` is
/// the default TTL for records that don't set their own and every
/// emitted TTL is clamped down to `minimum`.
pub struct Zone {
    name: Name,
    label_count: usize,
    tree: Node,
    authority: Soa,
    on_unload: Option<UnloadHook>,
}

impl Zone {
    /// Creates a new `Zone` over the given resolving tree.
    pub fn new(name: Name, tree: Node, authority: Soa) -> Result<Self, Error> {
        if authority.minimum < authority.refresh {
            return Err(Error::SoaMinimumBelowRefresh);
        }
        Ok(Self {
            label_count: name.label_count(),
            name,
            tree,
            authority,
            on_unload: None,
        })
    }

    /// Attaches a hook to run when this zone is unloaded (replaced in
    /// the registry).
    pub fn with_unload_hook(mut self, hook: UnloadHook) -> Self {
        self.on_unload = Some(hook);
        self
    }

    /// Returns the zone's name.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Returns the zone's SOA authority data.
    pub fn authority(&self) -> &Soa {
        &self.authority
    }

    pub(crate) fn unload_hook(&self) -> Option<&UnloadHook> {
        self.on_unload.as_ref()
    }

    /// Builds the zone's SOA resource record. Per convention the
    /// record is owned by the SOA's primary name and carries the
    /// refresh interval as its TTL.
    fn authority_record(&self) -> Record {
        Record {
            name: self.authority.mname.clone(),
            rr_type: Type::SOA,
            class: Class::IN,
            ttl: self.authority.refresh,
            data: Rdata::Soa(self.authority.clone()),
        }
    }

    /// Handles a question, mutating the response as needed.
    ///
    /// Each pass locates the leaf for the question's current name and
    /// dispatches on its kind. CNAMEs whose target lies inside this
    /// zone, and internal redirects, rewrite the question's name and
    /// loop back into another lookup within the same zone (never the
    /// whole resolver chain); the question's redirect counter bounds
    /// the loop.
    pub fn handle(&self, ctx: &mut Context) -> ProcessingResult<()> {
        loop {
            let node = lookup::descend(&self.tree, &ctx.question.normalized, self.label_count);
            let leaf = select_leaf(node, ctx.question.qtype);
            debug!(
                "{}: {} {} -> {:?}",
                self.name, ctx.question.normalized, ctx.question.qtype, leaf,
            );

            // The zone's SOA becomes the fallback authority for an
            // empty answer, and a direct answer if SOA was asked for.
            ctx.response.cache_soa(self.authority_record());
            if ctx.question.qtype == Type::SOA {
                let mut soa = self.authority_record();
                soa.name = ctx.question.name.clone();
                ctx.response.push_answer(soa);
            }

            match leaf {
                Leaf::Static(entries) => {
                    for entry in entries {
                        self.push_static(ctx, entry);
                    }
                    return Ok(());
                }
                Leaf::Cname(destination) => {
                    ctx.response.push_answer(Record {
                        name: ctx.question.name.clone(),
                        rr_type: Type::CNAME,
                        class: Class::IN,
                        ttl: self.authority.refresh,
                        data: Rdata::Cname(destination.clone()),
                    });
                    // Only chase the target if it stays in this zone.
                    if !destination.eq_or_subdomain_of(&self.name) {
                        return Ok(());
                    }
                    self.redirect(ctx, destination)?;
                }
                Leaf::Redirect(destination) => {
                    self.redirect(ctx, destination)?;
                }
                Leaf::Dynamic(handler) => return handler(ctx),
                Leaf::Next => return ctx.next(),
            }
        }
    }

    /// Builds one resource record from a static entry and routes it to
    /// the answer or authority section. Missing fields default from
    /// the question and the zone's authority data; the TTL is clamped
    /// down to the SOA minimum.
    fn push_static(&self, ctx: &mut Context, entry: &StaticEntry) {
        let record = Record {
            name: entry
                .name
                .clone()
                .unwrap_or_else(|| ctx.question.name.clone()),
            rr_type: entry.rr_type.unwrap_or(ctx.question.qtype),
            class: Class::IN,
            ttl: entry
                .ttl
                .unwrap_or(self.authority.refresh)
                .min(self.authority.minimum),
            data: entry.data.clone(),
        };
        if entry.authority {
            ctx.response.push_authority(record);
        } else {
            ctx.response.push_answer(record);
        }
    }

    /// Rewrites the question to `destination` for another pass within
    /// this zone, charging one hop against the redirect budget.
    fn redirect(&self, ctx: &mut Context, destination: &Name) -> ProcessingResult<()> {
        ctx.question.redirect_count += 1;
        if ctx.question.redirect_count > ctx.config.max_redirects {
            return Err(ProcessingError::RedirectLimit);
        }
        ctx.question.rewrite(destination);
        Ok(())
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Zone").field("name", &self.name).finish()
    }
}

/// Selects the leaf to dispatch on: the question type's entry if
/// present, else the `ANY` entry, else the node itself if it is a
/// terminal leaf, else (including on a lookup miss) delegation onward.
fn select_leaf(node: Option<&Node>, qtype: Type) -> &Leaf {
    const DELEGATE: &Leaf = &Leaf::Next;
    match node {
        None => DELEGATE,
        Some(node) => node
            .records
            .get(&qtype)
            .or_else(|| node.records.get(&Type::ANY))
            .or(node.leaf.as_ref())
            .unwrap_or(DELEGATE),
    }
}

////////////////////////////////////////////////////////////////////////
// NODES AND LEAVES                                                   //
////////////////////////////////////////////////////////////////////////

/// A node in a zone's resolving tree.
///
/// Child labels are stored (and matched) ASCII-lowercased; the label
/// `*` denotes the wildcard child.
#[derive(Clone, Default)]
pub struct Node {
    leaf: Option<Leaf>,
    records: HashMap<Type, Leaf>,
    children: HashMap<Box<str>, Node>,
}

impl Node {
    /// Creates an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the leaf for one record type (builder form). `Type::ANY`
    /// makes the leaf answer every record type.
    pub fn with_record(mut self, rr_type: Type, leaf: Leaf) -> Self {
        self.set_record(rr_type, leaf);
        self
    }

    /// Makes this node itself a terminal leaf (builder form): descent
    /// stops here, and the leaf answers whatever is asked beneath it.
    pub fn with_leaf(mut self, leaf: Leaf) -> Self {
        self.set_leaf(leaf);
        self
    }

    /// Adds a child node under `label` (builder form).
    pub fn with_child(mut self, label: &str, child: Node) -> Self {
        self.children
            .insert(label.to_ascii_lowercase().into_boxed_str(), child);
        self
    }

    /// Adds the wildcard child (builder form).
    pub fn with_wildcard(self, child: Node) -> Self {
        self.with_child("*", child)
    }

    /// Sets the leaf for one record type.
    pub fn set_record(&mut self, rr_type: Type, leaf: Leaf) {
        self.records.insert(rr_type, leaf);
    }

    /// Makes this node itself a terminal leaf.
    pub fn set_leaf(&mut self, leaf: Leaf) {
        self.leaf = Some(leaf);
    }

    /// Returns the child node under `label`, creating it (and nothing
    /// else) if absent.
    pub fn child_mut(&mut self, label: &str) -> &mut Node {
        self.children
            .entry(label.to_ascii_lowercase().into_boxed_str())
            .or_default()
    }
}

/// One way of answering a question: the terminal kinds of a zone
/// tree.
#[derive(Clone)]
pub enum Leaf {
    /// An ordered list of record data to emit.
    Static(Vec<StaticEntry>),
    /// A CNAME pointing at the destination name. In-zone destinations
    /// are chased like internal redirects; external ones end local
    /// resolution.
    Cname(Name),
    /// A same-zone name rewrite: restart lookup at the destination.
    Redirect(Name),
    /// A custom handler invoked with the question's context.
    Dynamic(Handler),
    /// Pass the question onward along the resolver chain.
    Next,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static(entries) => write!(f, "Static({} entries)", entries.len()),
            Self::Cname(destination) => write!(f, "Cname({})", destination),
            Self::Redirect(destination) => write!(f, "Redirect({})", destination),
            Self::Dynamic(_) => f.write_str("Dynamic"),
            Self::Next => f.write_str("Next"),
        }
    }
}

/// One record of a static leaf: record data plus optional overrides
/// of the fields that otherwise default from the question and the
/// zone (type, owner name, TTL). Entries flagged `authority` are
/// routed to the authority section instead of the answer section.
#[derive(Clone, Debug)]
pub struct StaticEntry {
    pub rr_type: Option<Type>,
    pub name: Option<Name>,
    pub ttl: Option<Ttl>,
    pub authority: bool,
    pub data: Rdata,
}

impl StaticEntry {
    /// Creates an entry with no overrides.
    pub fn new(data: Rdata) -> Self {
        Self {
            rr_type: None,
            name: None,
            ttl: None,
            authority: false,
            data,
        }
    }

    /// Overrides the record type (builder form).
    pub fn with_type(mut self, rr_type: Type) -> Self {
        self.rr_type = Some(rr_type);
        self
    }

    /// Overrides the owner name (builder form).
    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    /// Overrides the TTL (builder form).
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Routes this entry to the authority section (builder form).
    pub fn into_authority(mut self) -> Self {
        self.authority = true;
        self
    }
}

impl From<Rdata> for StaticEntry {
    fn from(data: Rdata) -> Self {
        Self::new(data)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Error, Node, Zone};
    use crate::name::Name;
    use crate::rr::{Soa, Ttl};

    fn soa(refresh: u32, minimum: u32) -> Soa {
        Soa {
            mname: "ns1.example.com".parse().unwrap(),
            rname: "hostmaster.example.com".parse().unwrap(),
            serial: 1,
            refresh: Ttl::from(refresh),
            retry: Ttl::from(600),
            expire: Ttl::from(86400),
            minimum: Ttl::from(minimum),
        }
    }

    #[test]
    fn construction_rejects_minimum_below_refresh() {
        let name: Name = "example.com".parse().unwrap();
        let result = Zone::new(name, Node::new(), soa(3600, 60));
        assert_eq!(result.unwrap_err(), Error::SoaMinimumBelowRefresh);
    }

    #[test]
    fn construction_accepts_equal_minimum_and_refresh() {
        let name: Name = "example.com".parse().unwrap();
        assert!(Zone::new(name, Node::new(), soa(60, 60)).is_ok());
    }
}
