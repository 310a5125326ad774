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

//! Implementation of the [`ResponseBuilder`].

use crate::message::{constants, Message, Rcode};
use crate::rr::Record;

////////////////////////////////////////////////////////////////////////
// RESPONSE BUILDER                                                   //
////////////////////////////////////////////////////////////////////////

/// Accumulates a response to one query message.
///
/// Construction copies the query in full (identifiers, the question
/// section, and any additional-records data come along) and resets it
/// to an empty response (flags zeroed). Handlers then push answer and
/// authority records and adjust the rcode and protocol flags;
/// [`finalize`](ResponseBuilder::finalize) encodes flags and rcode
/// into the message's flag word exactly once (it consumes the
/// builder) and applies the negative-answer convention: an otherwise
/// empty NOERROR response gets the responsible zone's cached SOA in
/// its authority section.
#[derive(Debug)]
pub struct ResponseBuilder {
    message: Message,
    rcode: Rcode,
    flags: Flags,
    soa: Option<Record>,
}

impl ResponseBuilder {
    /// Creates a builder for a response to `query`.
    pub fn new(query: &Message) -> Self {
        let mut message = query.clone();
        message.response = true;
        message.flags = 0;
        Self {
            message,
            rcode: Rcode::NoError,
            flags: Flags::default(),
            soa: None,
        }
    }

    /// Adds a record to the answer section.
    pub fn push_answer(&mut self, answer: Record) {
        self.message.answers.push(answer);
    }

    /// Adds a record to the authority section.
    pub fn push_authority(&mut self, authority: Record) {
        self.message.authorities.push(authority);
    }

    /// Returns the records accumulated in the answer section so far.
    pub fn answers(&self) -> &[Record] {
        &self.message.answers
    }

    /// Sets the response's rcode.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.rcode = rcode;
    }

    /// Returns the response's rcode.
    pub fn rcode(&self) -> Rcode {
        self.rcode
    }

    /// Returns the response's protocol flags.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Returns the response's protocol flags for mutation.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Caches `soa` as the authority record to fall back on when the
    /// response ends up with an empty answer section. The zone that
    /// most recently handled a question wins.
    pub fn cache_soa(&mut self, soa: Record) {
        self.soa = Some(soa);
    }

    /// Returns the cached fallback SOA record, if any.
    pub fn cached_soa(&self) -> Option<&Record> {
        self.soa.as_ref()
    }

    /// Encodes the rcode and flags into the message and returns it.
    pub fn finalize(mut self) -> Message {
        let mut flags = u16::from(u8::from(self.rcode)) & constants::RCODE_MASK;
        if self.flags.authoritative {
            flags |= constants::AUTHORITATIVE_ANSWER;
        }
        if self.flags.truncated {
            flags |= constants::TRUNCATED_RESPONSE;
        }
        if self.flags.recursion_desired {
            flags |= constants::RECURSION_DESIRED;
        }
        if self.flags.recursion_available {
            flags |= constants::RECURSION_AVAILABLE;
        }
        if self.flags.authentic_data {
            flags |= constants::AUTHENTIC_DATA;
        }
        if self.flags.checking_disabled {
            flags |= constants::CHECKING_DISABLED;
        }
        if self.flags.dnssec_ok {
            flags |= constants::DNSSEC_OK;
        }
        self.message.flags = flags;

        if self.message.answers.is_empty() && self.rcode == Rcode::NoError {
            if let Some(soa) = self.soa {
                self.message.authorities.push(soa);
            }
        }
        self.message
    }
}

/// The protocol flags of a response, in decoded form until
/// [`ResponseBuilder::finalize`] encodes them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    pub dnssec_ok: bool,
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ResponseBuilder;
    use crate::class::Class;
    use crate::message::{constants, Message, Question, Rcode};
    use crate::name::Name;
    use crate::rr::{Rdata, Record, Soa, Ttl, Type};

    fn query() -> Message {
        Message::query(
            7,
            vec![Question {
                name: "www.example.com".parse().unwrap(),
                qtype: Type::A,
                qclass: Class::IN,
            }],
        )
    }

    fn soa_record() -> Record {
        let mname: Name = "ns1.example.com".parse().unwrap();
        Record {
            name: mname.clone(),
            rr_type: Type::SOA,
            class: Class::IN,
            ttl: Ttl::from(60),
            data: Rdata::Soa(Soa {
                mname,
                rname: "hostmaster.example.com".parse().unwrap(),
                serial: 1,
                refresh: Ttl::from(60),
                retry: Ttl::from(30),
                expire: Ttl::from(86400),
                minimum: Ttl::from(60),
            }),
        }
    }

    #[test]
    fn construction_copies_the_query_and_resets_it() {
        let mut query = query();
        query.flags = constants::RECURSION_DESIRED;
        let builder = ResponseBuilder::new(&query);
        let response = builder.finalize();
        assert!(response.response);
        assert_eq!(response.id, 7);
        assert_eq!(response.questions, query.questions);
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(!response.has_flags(constants::RECURSION_DESIRED));
    }

    #[test]
    fn finalize_encodes_rcode_and_flags() {
        let query = query();
        let mut builder = ResponseBuilder::new(&query);
        builder.set_rcode(Rcode::ServFail);
        builder.flags_mut().authoritative = true;
        builder.flags_mut().dnssec_ok = true;
        let response = builder.finalize();
        assert_eq!(response.rcode(), Rcode::ServFail);
        assert!(response.has_flags(constants::AUTHORITATIVE_ANSWER));
        assert!(response.has_flags(constants::DNSSEC_OK));
        assert!(!response.has_flags(constants::TRUNCATED_RESPONSE));
    }

    #[test]
    fn empty_noerror_responses_fall_back_to_the_cached_soa() {
        let query = query();
        let mut builder = ResponseBuilder::new(&query);
        builder.cache_soa(soa_record());
        let response = builder.finalize();
        assert!(response.answers.is_empty());
        assert_eq!(response.authorities.len(), 1);
        assert_eq!(response.authorities[0].rr_type, Type::SOA);
    }

    #[test]
    fn the_fallback_needs_an_empty_answer_section_and_noerror() {
        // With an answer present, no fallback.
        let query = query();
        let mut builder = ResponseBuilder::new(&query);
        builder.cache_soa(soa_record());
        builder.push_answer(Record {
            name: "www.example.com".parse().unwrap(),
            rr_type: Type::A,
            class: Class::IN,
            ttl: Ttl::from(60),
            data: Rdata::A("192.0.2.1".parse().unwrap()),
        });
        let response = builder.finalize();
        assert!(response.authorities.is_empty());

        // With a failure rcode, no fallback either.
        let mut builder = ResponseBuilder::new(&query);
        builder.cache_soa(soa_record());
        builder.set_rcode(Rcode::ServFail);
        let response = builder.finalize();
        assert!(response.authorities.is_empty());
    }
}
