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

//! Data structures and routines for handling DNS resource records.

use serde::{Deserialize, Serialize};

use crate::class::Class;
use crate::name::Name;

mod rdata;
mod rr_type;
mod ttl;
pub use rdata::{Rdata, Soa};
pub use rr_type::Type;
pub use ttl::Ttl;

/// A single decoded resource record.
///
/// This is the unit the Response Builder accumulates into the answer
/// and authority sections. The `rr_type` field is carried separately
/// from the [`Rdata`] variant, as decoded-message codecs do; the engine
/// fills it from the question when a zone's record data doesn't specify
/// its own.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: Name,
    #[serde(rename = "type")]
    pub rr_type: Type,
    #[serde(default)]
    pub class: Class,
    pub ttl: Ttl,
    pub data: Rdata,
}
