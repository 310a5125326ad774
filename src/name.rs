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

//! Implementation of the [`Name`] type for domain names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A domain name, stored in its textual dot-separated form.
///
/// `Name`s preserve the case in which they were written, since answers
/// are expected to echo the case of the question ([RFC 1035 § 7.1]
/// suggests as much for responders that copy the question). Name
/// comparison in the DNS, however, is case-insensitive, so equality,
/// hashing, and the subdomain tests all operate on the ASCII-lowercased
/// form.
///
/// Unlike wire-format names, a `Name` never contains the root label:
/// the engine deals only in fully qualified names written without the
/// trailing dot, which is the convention of the decoded-message codec
/// it sits behind.
///
/// [RFC 1035 § 7.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-7.1
#[derive(Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(Box<str>);

impl Name {
    /// Returns the textual form of this name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an iterator over this name's labels, leftmost (most
    /// specific) first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns an iterator over this name's labels, rightmost (closest
    /// to the root) first. This is the traversal order of every DNS
    /// tree in the crate.
    pub fn labels_reversed(&self) -> impl Iterator<Item = &str> {
        self.0.rsplit('.')
    }

    /// Returns the number of labels in this name. This is always at
    /// least one.
    pub fn label_count(&self) -> usize {
        self.0.split('.').count()
    }

    /// Returns a copy of this name with every label ASCII-lowercased.
    pub fn to_lowercase(&self) -> Name {
        Name(self.0.to_ascii_lowercase().into_boxed_str())
    }

    /// Returns whether this name is a strict subdomain of `other`,
    /// compared case-insensitively and aligned on label boundaries
    /// (so `b.example.com` is a subdomain of `example.com` but not of
    /// `xample.com`).
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if self.0.len() <= other.0.len() + 1 {
            return false;
        }
        let split = self.0.len() - other.0.len();
        self.0[split..].eq_ignore_ascii_case(&other.0)
            && self.0.as_bytes()[split - 1] == b'.'
    }

    /// Returns whether this name equals `other` or is a strict
    /// subdomain of it (see [`Name::is_subdomain_of`]).
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self == other || self.is_subdomain_of(other)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            Err(NameError::Empty)
        } else if text.split('.').any(str::is_empty) {
            Err(NameError::EmptyLabel)
        } else {
            Ok(Self(text.into()))
        }
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0.into()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when parsing a [`Name`] from text.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NameError {
    Empty,
    EmptyLabel,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Empty => f.write_str("domain names must not be empty"),
            Self::EmptyLabel => f.write_str("domain names must not contain empty labels"),
        }
    }
}

impl std::error::Error for NameError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Name, NameError};

    #[test]
    fn rejects_empty_names_and_labels() {
        assert_eq!("".parse::<Name>(), Err(NameError::Empty));
        assert_eq!(".".parse::<Name>(), Err(NameError::EmptyLabel));
        assert_eq!("example.com.".parse::<Name>(), Err(NameError::EmptyLabel));
        assert_eq!("a..b".parse::<Name>(), Err(NameError::EmptyLabel));
    }

    #[test]
    fn equality_ignores_case() {
        let lower: Name = "www.example.com".parse().unwrap();
        let mixed: Name = "WWW.Example.COM".parse().unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(mixed.to_lowercase().as_str(), "www.example.com");
        assert_eq!(mixed.as_str(), "WWW.Example.COM");
    }

    #[test]
    fn reversed_labels_run_toward_the_root() {
        let name: Name = "www.example.com".parse().unwrap();
        let labels: Vec<&str> = name.labels_reversed().collect();
        assert_eq!(labels, ["com", "example", "www"]);
        let labels: Vec<&str> = name.labels().collect();
        assert_eq!(labels, ["www", "example", "com"]);
        assert_eq!(name.label_count(), 3);
    }

    #[test]
    fn subdomain_tests_align_on_label_boundaries() {
        let zone: Name = "example.com".parse().unwrap();
        let www: Name = "www.EXAMPLE.com".parse().unwrap();
        let decoy: Name = "www.badexample.com".parse().unwrap();
        assert!(www.is_subdomain_of(&zone));
        assert!(www.eq_or_subdomain_of(&zone));
        assert!(!decoy.is_subdomain_of(&zone));
        assert!(!zone.is_subdomain_of(&zone));
        assert!(zone.eq_or_subdomain_of(&zone));
    }
}
