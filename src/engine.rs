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

//! Implementation of the query-processing [`Engine`].
//!
//! The engine drives one decoded DNS message at a time: it wraps the
//! message in a [`ResponseBuilder`](crate::response::ResponseBuilder),
//! assembles a resolver chain per question, runs the chain through a
//! cooperative continuation ([`Context::next`]), and contains failures
//! at the per-question boundary so that one bad question never takes
//! down its siblings; the client always gets a well-formed response.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, warn};

use crate::class::Class;
use crate::config::{Config, ConfigSource};
use crate::message::{Message, Question, Rcode};
use crate::module::{BoxError, Module, ModuleProvider};
use crate::name::Name;
use crate::registry::Registry;
use crate::response::ResponseBuilder;
use crate::rr::{Rdata, Record, Ttl, Type};

////////////////////////////////////////////////////////////////////////
// ENGINE                                                             //
////////////////////////////////////////////////////////////////////////

/// The query-processing engine.
///
/// An `Engine` owns the active [`Registry`] and [`Config`] as
/// atomically swappable snapshots. [`Engine::reload`] refreshes the
/// configuration and rebuilds the registry from scratch, then swaps
/// both in; resolutions running concurrently keep whatever snapshot
/// they captured at the start of [`Engine::answer`], so a reload can
/// never corrupt them. A fresh engine serves nothing until the first
/// `reload`.
pub struct Engine {
    registry: ArcSwap<Registry>,
    config: ArcSwap<Config>,
    modules: Box<dyn ModuleProvider>,
    config_source: Box<dyn ConfigSource>,
}

impl Engine {
    /// Creates an engine over the given configuration and module
    /// supply boundaries. Call [`Engine::reload`] to load both.
    pub fn new(
        config_source: impl ConfigSource + 'static,
        modules: impl ModuleProvider + 'static,
    ) -> Self {
        Self {
            registry: ArcSwap::from_pointee(Registry::new()),
            config: ArcSwap::from_pointee(Config::default()),
            modules: Box::new(modules),
            config_source: Box::new(config_source),
        }
    }

    /// Refreshes the configuration and re-registers the full module
    /// set from scratch.
    ///
    /// This is a full rebuild, not an incremental patch: the new
    /// registry is built completely and then swapped in atomically.
    /// On failure nothing is swapped and the previous snapshots stay
    /// in service.
    pub fn reload(&self) -> Result<(), BoxError> {
        let config = self.config_source.fetch()?;
        let mut registry = Registry::new();
        for module in self.modules.modules()? {
            registry.register(module);
        }
        debug!("reloaded {} modules", registry.module_count());
        self.config.store(Arc::new(config));
        self.registry.store(Arc::new(registry));
        Ok(())
    }

    /// Returns the active configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Answers one decoded query message.
    ///
    /// Questions are processed independently: each gets its own
    /// resolver chain and context, and a failure in one is contained
    /// there: the rcode is forced to SERVFAIL (message-wide, since
    /// DNS has one rcode per message) and, when debug mode is on, the
    /// failure's diagnostic chain is emitted as synthetic TXT answer
    /// records. The response is always finalized and returned.
    pub fn answer(&self, query: &Message) -> Message {
        let registry = self.registry.load_full();
        let config = self.config.load_full();
        let config: &Config = &config;

        let mut response = ResponseBuilder::new(query);
        response.flags_mut().authoritative = true;

        for question in &query.questions {
            let active = ActiveQuestion::new(question);
            let chain = registry.find_resolvers(&active.normalized);
            let mut ctx = Context {
                question: active,
                request: query,
                response: &mut response,
                config,
                chain: Chain::new(chain),
            };
            let outcome = ctx.next();
            let question_name = ctx.question.name.clone();
            drop(ctx);

            if let Err(error) = outcome {
                warn!("question for {} failed: {}", question_name, error);
                response.set_rcode(Rcode::ServFail);
                if config.debug {
                    for line in diagnostic_lines(&error) {
                        response.push_answer(Record {
                            name: question_name.clone(),
                            rr_type: Type::TXT,
                            class: Class::IN,
                            ttl: Ttl::ZERO,
                            data: Rdata::Txt(line),
                        });
                    }
                }
            }
        }

        response.finalize()
    }
}

/// Flattens a processing failure and its cause chain into diagnostic
/// lines for the debug-mode TXT records.
fn diagnostic_lines(error: &ProcessingError) -> Vec<String> {
    let mut lines: Vec<String> = error.to_string().lines().map(str::to_owned).collect();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        lines.extend(cause.to_string().lines().map(str::to_owned));
        source = cause.source();
    }
    lines
}

////////////////////////////////////////////////////////////////////////
// CONTEXTS                                                           //
////////////////////////////////////////////////////////////////////////

/// The context for handling one question: the question's working
/// state, the original request, the shared response, the configuration
/// snapshot, and the continuation over the question's resolver chain.
pub struct Context<'a> {
    pub question: ActiveQuestion,
    pub request: &'a Message,
    pub response: &'a mut ResponseBuilder,
    pub config: &'a Config,
    chain: Chain,
}

impl Context<'_> {
    /// Invokes the next module in the resolver chain, or does nothing
    /// if the chain is exhausted (the response is then returned as
    /// accumulated).
    pub fn next(&mut self) -> ProcessingResult<()> {
        match self.chain.advance() {
            Some(module) => module.handle(self),
            None => Ok(()),
        }
    }
}

/// The working state of one question, reset per question and mutated
/// in place as redirects rewrite it.
#[derive(Clone, Debug)]
pub struct ActiveQuestion {
    /// The name being resolved, in the case it was asked in (answers
    /// echo it). Rewritten by redirects.
    pub name: Name,
    /// The lowercased form of `name`, used for all matching.
    pub normalized: Name,
    /// The name originally asked, untouched by redirects.
    pub original: Name,
    pub qtype: Type,
    pub qclass: Class,
    /// Internal redirect hops taken so far.
    pub redirect_count: u32,
}

impl ActiveQuestion {
    fn new(question: &Question) -> Self {
        Self {
            name: question.name.clone(),
            normalized: question.name.to_lowercase(),
            original: question.name.clone(),
            qtype: question.qtype,
            qclass: question.qclass,
            redirect_count: 0,
        }
    }

    /// Points the question at `destination`, keeping the normalized
    /// form in step.
    pub fn rewrite(&mut self, destination: &Name) {
        self.name = destination.clone();
        self.normalized = destination.to_lowercase();
    }
}

/// An explicit cursor over a question's precomputed resolver chain.
///
/// The chain is ordered global-middlewares-first, most-specific-zone
/// last, and consumed from the end: the most specific match runs
/// first and each call to [`Context::next`] falls back one step.
struct Chain {
    modules: Vec<Arc<Module>>,
    remaining: usize,
}

impl Chain {
    fn new(modules: Vec<Arc<Module>>) -> Self {
        Self {
            remaining: modules.len(),
            modules,
        }
    }

    fn advance(&mut self) -> Option<Arc<Module>> {
        self.remaining = self.remaining.checked_sub(1)?;
        Some(self.modules[self.remaining].clone())
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// The result type for question processing.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Failures that arise while processing a single question. They are
/// contained at the per-question boundary and surface as SERVFAIL.
#[derive(Debug)]
pub enum ProcessingError {
    /// A redirect/CNAME chain exceeded the configured maximum.
    RedirectLimit,
    /// A module's handler failed.
    Handler(BoxError),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RedirectLimit => f.write_str("exceeded maximum internal redirect count"),
            Self::Handler(error) => write!(f, "handler failed: {}", error),
        }
    }
}

impl std::error::Error for ProcessingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RedirectLimit => None,
            Self::Handler(error) => Some(&**error),
        }
    }
}

impl From<BoxError> for ProcessingError {
    fn from(error: BoxError) -> Self {
        Self::Handler(error)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Engine, ProcessingError};
    use crate::class::Class;
    use crate::config::Config;
    use crate::message::{constants, Message, Question, Rcode};
    use crate::module::{BoxError, Middleware, Module};
    use crate::rr::{Rdata, Soa, Ttl, Type};
    use crate::zone::{build, Leaf, Node, StaticEntry, Zone};

    fn soa() -> Soa {
        Soa {
            mname: "ns1.example.com".parse().unwrap(),
            rname: "hostmaster.example.com".parse().unwrap(),
            serial: 2023010101,
            refresh: Ttl::from(300),
            retry: Ttl::from(600),
            expire: Ttl::from(86400),
            minimum: Ttl::from(3600),
        }
    }

    /// The example.com zone used throughout: a www host, an external
    /// CNAME, an internal alias, a redirect loop, and a handler that
    /// always fails.
    fn example_zone() -> Zone {
        let tree = Node::new()
            .with_child(
                "www",
                build::host(&["91.92.144.105".parse().unwrap()], &[])
                    .with_child("crashey", Node::new().with_leaf(Leaf::Dynamic(Arc::new(|_| {
                        Err(ProcessingError::Handler("handler exploded".into()))
                    })))),
            )
            .with_child("slow", Node::new().with_record(
                Type::A,
                Leaf::Static(vec![StaticEntry::new(Rdata::A("192.0.2.7".parse().unwrap()))
                    .with_ttl(Ttl::from(7200))]),
            ))
            .with_child("google", build::cname("www.google.com".parse().unwrap()))
            .with_child("alias", build::redirect("www.example.com".parse().unwrap()))
            .with_child("ouro", build::redirect("boros.example.com".parse().unwrap()))
            .with_child("boros", build::redirect("ouro.example.com".parse().unwrap()));
        Zone::new("example.com".parse().unwrap(), tree, soa()).unwrap()
    }

    fn engine_with(config: Config, modules: impl Fn() -> Vec<Module> + Send + Sync + 'static) -> Engine {
        let provider = move || -> Result<Vec<Module>, BoxError> { Ok(modules()) };
        let engine = Engine::new(config, provider);
        engine.reload().unwrap();
        engine
    }

    fn engine() -> Engine {
        engine_with(Config::default(), || {
            vec![Module::Zone(example_zone())]
        })
    }

    fn question(name: &str, qtype: Type) -> Message {
        Message::query(
            42,
            vec![Question {
                name: name.parse().unwrap(),
                qtype,
                qclass: Class::IN,
            }],
        )
    }

    #[test]
    fn answers_static_records_with_clamped_ttls() {
        let response = engine().answer(&question("www.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.has_flags(constants::AUTHORITATIVE_ANSWER));
        assert_eq!(response.answers.len(), 1);
        let answer = &response.answers[0];
        assert_eq!(answer.name.as_str(), "www.example.com");
        assert_eq!(answer.rr_type, Type::A);
        assert_eq!(answer.data, Rdata::A("91.92.144.105".parse().unwrap()));
        // Defaulted from the zone refresh interval, under the minimum.
        assert_eq!(answer.ttl, Ttl::from(300));
    }

    #[test]
    fn clamps_record_ttls_down_to_the_soa_minimum() {
        let response = engine().answer(&question("slow.example.com", Type::A));
        assert_eq!(response.answers[0].ttl, Ttl::from(3600));
    }

    #[test]
    fn answers_echo_the_case_of_the_question() {
        let response = engine().answer(&question("WWW.Example.Com", Type::A));
        assert_eq!(response.answers[0].name.as_str(), "WWW.Example.Com");
    }

    #[test]
    fn soa_questions_get_the_authority_data_as_an_answer() {
        let response = engine().answer(&question("example.com", Type::SOA));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.answers.len(), 1);
        let answer = &response.answers[0];
        assert_eq!(answer.rr_type, Type::SOA);
        assert_eq!(answer.name.as_str(), "example.com");
        match &answer.data {
            Rdata::Soa(soa) => assert_eq!(soa.serial, 2023010101),
            other => panic!("unexpected rdata: {:?}", other),
        }
    }

    #[test]
    fn external_cnames_produce_exactly_one_answer() {
        let response = engine().answer(&question("google.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].rr_type, Type::CNAME);
        assert_eq!(
            response.answers[0].data,
            Rdata::Cname("www.google.com".parse().unwrap()),
        );
    }

    #[test]
    fn internal_redirects_resolve_within_the_zone() {
        let response = engine().answer(&question("alias.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].rr_type, Type::A);
        // The answer carries the rewritten name.
        assert_eq!(response.answers[0].name.as_str(), "www.example.com");
    }

    #[test]
    fn redirect_loops_hit_the_limit_and_servfail() {
        let response = engine().answer(&question("ouro.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::ServFail);
        // Debug is off by default: no diagnostic leaks.
        assert!(response.answers.is_empty());

        // Idempotence: a second run gives the same outcome.
        let again = engine().answer(&question("ouro.example.com", Type::A));
        assert_eq!(again.rcode(), Rcode::ServFail);
        assert!(again.answers.is_empty());
    }

    #[test]
    fn failing_dynamic_handlers_servfail_and_leak_only_in_debug() {
        let response = engine().answer(&question("crashey.www.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::ServFail);
        assert!(response.answers.is_empty());

        let debug_engine = engine_with(
            Config {
                debug: true,
                ..Config::default()
            },
            || vec![Module::Zone(example_zone())],
        );
        let response = debug_engine.answer(&question("crashey.www.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::ServFail);
        assert!(!response.answers.is_empty());
        assert!(response
            .answers
            .iter()
            .all(|record| record.rr_type == Type::TXT));
        match &response.answers[0].data {
            Rdata::Txt(text) => assert!(text.contains("handler exploded")),
            other => panic!("unexpected rdata: {:?}", other),
        }
    }

    #[test]
    fn unmatched_names_yield_an_empty_noerror_response() {
        let response = engine().answer(&question("example.net", Type::A));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.answers.is_empty());
        // No zone handled the question, so no SOA was cached either.
        assert!(response.authorities.is_empty());
    }

    #[test]
    fn empty_in_zone_answers_carry_the_soa_in_authority() {
        // The name misses within the zone: NOERROR, empty answers,
        // exactly one SOA in authority.
        let response = engine().answer(&question("missing.example.com", Type::A));
        assert_eq!(response.rcode(), Rcode::NoError);
        assert!(response.answers.is_empty());
        assert_eq!(response.authorities.len(), 1);
        assert_eq!(response.authorities[0].rr_type, Type::SOA);
    }

    #[test]
    fn one_failing_question_does_not_abort_its_siblings() {
        let mut query = question("www.example.com", Type::A);
        query.questions.push(Question {
            name: "ouro.example.com".parse().unwrap(),
            qtype: Type::A,
            qclass: Class::IN,
        });
        let response = engine().answer(&query);
        // The failing question forces the message-wide rcode, but the
        // healthy question still contributed its answer.
        assert_eq!(response.rcode(), Rcode::ServFail);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name.as_str(), "www.example.com");
    }

    #[test]
    fn global_middlewares_run_when_zones_delegate() {
        let engine = engine_with(Config::default(), || {
            vec![
                Module::Zone(example_zone()),
                Module::Middleware(Middleware::new(Arc::new(|ctx| {
                    ctx.response.flags_mut().recursion_available = true;
                    Ok(())
                }))),
            ]
        });
        // A miss within the zone delegates onward to the middleware.
        let response = engine.answer(&question("missing.example.com", Type::A));
        assert!(response.has_flags(constants::RECURSION_AVAILABLE));
    }

    #[test]
    fn reload_swaps_snapshots_without_disturbing_captured_ones() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let empty = Arc::new(AtomicBool::new(false));
        let flag = empty.clone();
        let engine = Engine::new(Config::default(), move || -> Result<Vec<Module>, BoxError> {
            if flag.load(Ordering::SeqCst) {
                Ok(Vec::new())
            } else {
                Ok(vec![Module::Zone(example_zone())])
            }
        });
        engine.reload().unwrap();
        assert_eq!(
            engine.answer(&question("www.example.com", Type::A)).answers.len(),
            1,
        );

        empty.store(true, Ordering::SeqCst);
        engine.reload().unwrap();
        assert!(engine
            .answer(&question("www.example.com", Type::A))
            .answers
            .is_empty());
    }

    #[test]
    fn failed_reloads_keep_the_previous_module_set() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let fail = Arc::new(AtomicBool::new(false));
        let flag = fail.clone();
        let engine = Engine::new(Config::default(), move || -> Result<Vec<Module>, BoxError> {
            if flag.load(Ordering::SeqCst) {
                Err("module source unavailable".into())
            } else {
                Ok(vec![Module::Zone(example_zone())])
            }
        });
        engine.reload().unwrap();

        fail.store(true, Ordering::SeqCst);
        assert!(engine.reload().is_err());
        let response = engine.answer(&question("www.example.com", Type::A));
        assert_eq!(response.answers.len(), 1);
    }

    #[test]
    fn dynamic_handlers_can_push_answers() {
        let engine = engine_with(Config::default(), || {
            let tree = Node::new().with_child(
                "hello",
                Node::new().with_leaf(Leaf::Dynamic(Arc::new(|ctx| {
                    let name = ctx.question.name.clone();
                    ctx.response.push_answer(crate::rr::Record {
                        name,
                        rr_type: Type::TXT,
                        class: Class::IN,
                        ttl: Ttl::from(60),
                        data: Rdata::Txt("hello!".to_owned()),
                    });
                    Ok(())
                }))),
            );
            vec![Module::Zone(
                Zone::new("example.com".parse().unwrap(), tree, soa()).unwrap(),
            )]
        });
        let response = engine.answer(&question("hello.example.com", Type::TXT));
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].data, Rdata::Txt("hello!".to_owned()));
    }
}
