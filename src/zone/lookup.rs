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

//! Implementation of zone-tree descent.

use super::Node;
use crate::name::Name;
use crate::rr::Type;

/// Walks `root`'s tree toward the node responsible for `name`.
///
/// `name`'s labels are consumed in reversed order (rightmost first),
/// with the first `skip_labels` labels dropped; callers pass the label
/// count of the zone's own name, so descent starts just below the apex.
/// At each step, in order:
///
/// 1. If the current node is itself a terminal leaf, or answers every
///    record type through an [`ANY`](Type::ANY) entry, descent stops
///    there: such a node covers everything beneath it.
/// 2. If the current node has a wildcard (`*`) child, descent jumps to
///    it and stops, whatever labels remain.
/// 3. Otherwise descent moves to the child for the current label,
///    returning `None` (no match) if there is none.
///
/// Matching is expected to run on normalized (lowercased) names; child
/// labels are stored lowercased.
pub(super) fn descend<'a>(root: &'a Node, name: &Name, skip_labels: usize) -> Option<&'a Node> {
    let mut cursor = root;
    for label in name.labels_reversed().skip(skip_labels) {
        if cursor.leaf.is_some() || cursor.records.contains_key(&Type::ANY) {
            break;
        }
        if let Some(wildcard) = cursor.children.get("*") {
            cursor = wildcard;
            break;
        }
        cursor = cursor.children.get(label)?;
    }
    Some(cursor)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::descend;
    use crate::name::Name;
    use crate::rr::{Rdata, Type};
    use crate::zone::{Leaf, Node, StaticEntry};

    fn a_leaf(address: &str) -> Leaf {
        Leaf::Static(vec![StaticEntry::new(Rdata::A(address.parse().unwrap()))])
    }

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    // A tree for a zone of two labels (e.g. example.com): an A record
    // at the apex, "www" and "mail.internal" branches, and a wildcard
    // under "dyn".
    fn tree() -> Node {
        Node::new()
            .with_record(Type::A, a_leaf("192.0.2.1"))
            .with_child("www", Node::new().with_record(Type::A, a_leaf("192.0.2.2")))
            .with_child(
                "internal",
                Node::new().with_child(
                    "mail",
                    Node::new().with_record(Type::A, a_leaf("192.0.2.3")),
                ),
            )
            .with_child(
                "dyn",
                Node::new().with_wildcard(Node::new().with_record(Type::A, a_leaf("192.0.2.4"))),
            )
            .with_child(
                "alias",
                Node::new().with_record(Type::ANY, Leaf::Cname(name("www.example.com"))),
            )
    }

    #[test]
    fn finds_the_apex_and_plain_children() {
        let tree = tree();
        let apex = descend(&tree, &name("example.com"), 2).unwrap();
        assert!(apex.records.contains_key(&Type::A));
        let www = descend(&tree, &name("www.example.com"), 2).unwrap();
        assert!(www.records.contains_key(&Type::A));
        let mail = descend(&tree, &name("mail.internal.example.com"), 2).unwrap();
        assert!(mail.records.contains_key(&Type::A));
    }

    #[test]
    fn misses_yield_none() {
        let tree = tree();
        assert!(descend(&tree, &name("nope.example.com"), 2).is_none());
        assert!(descend(&tree, &name("deep.www.example.com"), 2).is_none());
    }

    #[test]
    fn wildcards_match_any_remaining_labels() {
        let tree = tree();
        let direct = descend(&tree, &name("a.dyn.example.com"), 2).unwrap();
        assert!(direct.records.contains_key(&Type::A));
        let deep = descend(&tree, &name("a.b.c.dyn.example.com"), 2).unwrap();
        assert!(deep.records.contains_key(&Type::A));
    }

    #[test]
    fn any_entries_terminate_descent_early() {
        let tree = tree();
        let exact = descend(&tree, &name("alias.example.com"), 2).unwrap();
        assert!(exact.records.contains_key(&Type::ANY));
        // Descent stops at "alias" even though more labels remain.
        let below = descend(&tree, &name("x.y.alias.example.com"), 2).unwrap();
        assert!(below.records.contains_key(&Type::ANY));
    }
}
