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

//! A modular authoritative DNS resolution engine.
//!
//! Burrow answers DNS queries from a set of registered modules: zones,
//! which own a resolving tree and SOA authority data for a domain
//! suffix, and middlewares, which are bare handlers for cross-cutting
//! response mutation. For each question the engine assembles a
//! resolver chain (global middlewares plus every zone matched along
//! the question name's reversed labels) and drives it as a stack of
//! cooperating handlers: the most specific zone runs first and hands
//! control onward by invoking the chain's continuation.
//!
//! The engine is authoritative-only and transport-agnostic: it
//! consumes one decoded query message and produces one decoded
//! response message ([`engine::Engine::answer`]), leaving wire-format
//! encoding, the network front end, and process lifecycle to the
//! embedding host. The `burrowd` binary in this repository is one such
//! host, serving the engine over a framed request/response socket.
//!
//! Hosts supply modules through a [`module::ModuleProvider`] and
//! configuration through a [`config::ConfigSource`];
//! [`engine::Engine::reload`] re-reads both and swaps the rebuilt
//! registry in atomically, so resolutions running during a reload are
//! undisturbed.

pub mod class;
pub mod config;
pub mod engine;
pub mod message;
pub mod module;
pub mod name;
pub mod registry;
pub mod response;
pub mod rr;
pub mod zone;

mod util;
