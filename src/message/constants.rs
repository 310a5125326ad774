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

//! Masks for the bits of [`Message::flags`](super::Message::flags).
//!
//! The layout matches the DNS header flag field of [RFC 1035 § 4.1.1],
//! except that the QR bit is carried by the message's `response`
//! marker instead, which leaves bit 15 free for the EDNS DO bit the
//! way decoded-message codecs conventionally fold it in.
//!
//! [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1

pub const AUTHORITATIVE_ANSWER: u16 = 1 << 10;
pub const TRUNCATED_RESPONSE: u16 = 1 << 9;
pub const RECURSION_DESIRED: u16 = 1 << 8;
pub const RECURSION_AVAILABLE: u16 = 1 << 7;
pub const AUTHENTIC_DATA: u16 = 1 << 5;
pub const CHECKING_DISABLED: u16 = 1 << 4;
pub const DNSSEC_OK: u16 = 1 << 15;
pub const RCODE_MASK: u16 = 0x000f;
