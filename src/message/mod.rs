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

//! Implementation of the decoded DNS message model.
//!
//! The engine sits behind an external wire-format codec: it consumes
//! one decoded query [`Message`] and produces one decoded response
//! [`Message`]. Encoding and decoding to wire bytes never happens here.

use serde::{Deserialize, Serialize};

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, Type};

pub mod constants;
mod rcode;
pub use rcode::{IntoRcodeError, Rcode};

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A decoded DNS message.
///
/// The layout follows [RFC 1035 § 4.1] as decoded-message codecs
/// present it: the QR bit is carried as the `response` marker rather
/// than inside `flags`, and the section counts are implied by the
/// section vectors. The remaining header flag bits and the RCODE live
/// in the `flags` word under the masks in [`constants`].
///
/// `Message` is [`Clone`]; cloning performs the full structural copy
/// that response construction relies on (no data is shared between a
/// query and the response seeded from it).
///
/// [RFC 1035 § 4.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: u16,
    #[serde(default)]
    pub response: bool,
    #[serde(default)]
    pub flags: u16,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<Record>,
    #[serde(default)]
    pub authorities: Vec<Record>,
    #[serde(default)]
    pub additionals: Vec<Record>,
}

impl Message {
    /// Creates a query message with the given ID and questions. This
    /// is a convenience for hosts and tests; inbound queries normally
    /// arrive from the codec fully formed.
    pub fn query(id: u16, questions: Vec<Question>) -> Self {
        Self {
            id,
            questions,
            ..Self::default()
        }
    }

    /// Returns the RCODE encoded in this message's flag word.
    pub fn rcode(&self) -> Rcode {
        // The mask guarantees a valid four-bit value.
        Rcode::try_from((self.flags & constants::RCODE_MASK) as u8).unwrap()
    }

    /// Returns whether the flag bits given by `mask` are all set.
    pub fn has_flags(&self, mask: u16) -> bool {
        self.flags & mask == mask
    }
}

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// One entry of a DNS message's question section ([RFC 1035 § 4.1.2]).
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub name: Name,
    #[serde(rename = "type")]
    pub qtype: Type,
    #[serde(rename = "class", default)]
    pub qclass: Class,
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
