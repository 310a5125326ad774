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

//! Convenience constructors for writing zone trees by hand.
//!
//! Pure data building; nothing here affects resolution semantics. The
//! helpers cover the record shapes hosts commonly declare inline:
//!
//! ```text
//! Node::new()
//!     .with_child("www", host(&["192.0.2.1".parse().unwrap()], &[]))
//!     .with_child("google", cname("www.google.com".parse().unwrap()))
//! ```

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Leaf, Node, StaticEntry};
use crate::name::Name;
use crate::rr::{Rdata, Type};

/// Builds a node answering A and AAAA questions with the given
/// addresses.
pub fn host(v4: &[Ipv4Addr], v6: &[Ipv6Addr]) -> Node {
    let a = v4.iter().map(|ip| StaticEntry::new(Rdata::A(*ip))).collect();
    let aaaa = v6
        .iter()
        .map(|ip| StaticEntry::new(Rdata::Aaaa(*ip)))
        .collect();
    Node::new()
        .with_record(Type::A, Leaf::Static(a))
        .with_record(Type::AAAA, Leaf::Static(aaaa))
}

/// Builds a static TXT leaf.
pub fn txt(text: &str) -> Leaf {
    Leaf::Static(vec![
        StaticEntry::new(Rdata::Txt(text.to_owned())).with_type(Type::TXT)
    ])
}

/// Builds a node that answers every record type with a CNAME.
pub fn cname(destination: Name) -> Node {
    Node::new().with_record(Type::ANY, Leaf::Cname(destination))
}

/// Builds a node that redirects every question to another name within
/// the same zone.
pub fn redirect(destination: Name) -> Node {
    Node::new().with_record(Type::ANY, Leaf::Redirect(destination))
}

/// Builds a static SRV leaf.
pub fn srv(priority: u16, weight: u16, port: u16, target: Name) -> Leaf {
    Leaf::Static(vec![StaticEntry::new(Rdata::Srv {
        priority,
        weight,
        port,
        target,
    })
    .with_type(Type::SRV)])
}

/// Builds a static URI leaf.
pub fn uri(priority: u16, weight: u16, target: &str) -> Leaf {
    Leaf::Static(vec![StaticEntry::new(Rdata::Uri {
        priority,
        weight,
        target: target.to_owned(),
    })
    .with_type(Type::URI)])
}

/// Builds a static SSHFP leaf from the named algorithm and
/// fingerprint type of [RFC 4255 § 3.1] and [RFC 6594].
///
/// [RFC 4255 § 3.1]: https://datatracker.ietf.org/doc/html/rfc4255#section-3.1
/// [RFC 6594]: https://datatracker.ietf.org/doc/html/rfc6594
pub fn sshfp(
    algorithm: &str,
    fingerprint_type: &str,
    fingerprint: &str,
) -> Result<Leaf, &'static str> {
    let algorithm = match algorithm.to_ascii_lowercase().as_str() {
        "reserved" => 0,
        "rsa" => 1,
        "dsa" => 2,
        "ecdsa" => 3,
        "ed25519" => 4,
        "ed448" => 6,
        _ => return Err("unknown SSHFP algorithm"),
    };
    let fingerprint_type = match fingerprint_type.to_ascii_lowercase().as_str() {
        "reserved" => 0,
        "sha1" | "sha-1" => 1,
        "sha256" | "sha-256" => 2,
        _ => return Err("unknown SSHFP fingerprint type"),
    };
    Ok(Leaf::Static(vec![StaticEntry::new(Rdata::Sshfp {
        algorithm,
        fingerprint_type,
        fingerprint: fingerprint.to_owned(),
    })
    .with_type(Type::SSHFP)]))
}

/// Copies a node's own leaves into a wildcard child, so the node
/// answers identically for itself and for anything beneath it.
pub fn wild_self(node: Node) -> Node {
    let child = Node {
        leaf: node.leaf.clone(),
        records: node.records.clone(),
        children: HashMap::new(),
    };
    node.with_wildcard(child)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sshfp_maps_named_constants() {
        let leaf = sshfp("Ed25519", "SHA-256", "abcdef").unwrap();
        match leaf {
            Leaf::Static(entries) => match &entries[0].data {
                Rdata::Sshfp {
                    algorithm,
                    fingerprint_type,
                    ..
                } => {
                    assert_eq!(*algorithm, 4);
                    assert_eq!(*fingerprint_type, 2);
                }
                other => panic!("unexpected rdata: {:?}", other),
            },
            other => panic!("unexpected leaf: {:?}", other),
        }
        assert!(sshfp("bogus", "sha1", "abcdef").is_err());
    }

    #[test]
    fn wild_self_repeats_records_under_the_wildcard() {
        let node = wild_self(host(&["192.0.2.1".parse().unwrap()], &[]));
        let copy = node.children.get("*").unwrap();
        assert!(copy.records.contains_key(&Type::A));
        assert!(copy.children.is_empty());
    }
}
