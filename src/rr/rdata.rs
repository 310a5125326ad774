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

//! Implementation of the [`Rdata`] type for decoded DNS RDATA.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::Ttl;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RDATA TYPE                                                         //
////////////////////////////////////////////////////////////////////////

/// The decoded RDATA of a resource record.
///
/// The engine works on decoded messages, so RDATA is modeled as a sum
/// type over the record-data forms its hosts actually produce, rather
/// than as raw octets. Conversion to and from the wire format is the
/// business of the external codec; here each variant serializes as an
/// externally tagged value (e.g. `{"A": "192.0.2.1"}`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Rdata {
    A(Ipv4Addr),
    #[serde(rename = "AAAA")]
    Aaaa(Ipv6Addr),
    #[serde(rename = "CNAME")]
    Cname(Name),
    #[serde(rename = "NS")]
    Ns(Name),
    #[serde(rename = "PTR")]
    Ptr(Name),
    #[serde(rename = "MX")]
    Mx { preference: u16, exchange: Name },
    #[serde(rename = "TXT")]
    Txt(String),
    #[serde(rename = "SOA")]
    Soa(Soa),
    #[serde(rename = "SRV")]
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    #[serde(rename = "SSHFP")]
    Sshfp {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: String,
    },
    #[serde(rename = "URI")]
    Uri {
        priority: u16,
        weight: u16,
        target: String,
    },
}

////////////////////////////////////////////////////////////////////////
// SOA DATA                                                           //
////////////////////////////////////////////////////////////////////////

/// The RDATA of an SOA record ([RFC 1035 § 3.3.13]).
///
/// Besides naming the primary server (`mname`) and the responsible
/// contact (`rname`), the SOA carries the zone timers the engine leans
/// on: `refresh` is the default TTL given to records that don't set
/// their own, and `minimum` is the ceiling every emitted TTL is clamped
/// to.
///
/// [RFC 1035 § 3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: Ttl,
    pub retry: Ttl,
    pub expire: Ttl,
    pub minimum: Ttl,
}
