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

//! Implements the `run` command (i.e., running the daemon).
//!
//! The daemon is a thin front end: it exposes the engine over a
//! framed request/response socket (a four-byte big-endian length
//! prefix followed by one JSON-encoded message per frame) and wires
//! SIGHUP to [`Engine::reload`]. Wire-format DNS encoding stays with
//! the peer on the other side of the socket.

use std::fmt::Write;
use std::io::{ErrorKind, Read, Write as IoWrite};
use std::net::{TcpListener, TcpStream};
use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use env_logger::Env;
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use burrow::engine::Engine;
use burrow::message::Message;

use crate::args::RunArgs;
use crate::config::FileSource;

/// Requests larger than this are refused outright.
const MAX_FRAME: usize = 1 << 20;

/// Runs the daemon.
pub fn run(args: RunArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(args: RunArgs) -> Result<()> {
    info!(
        "Burrow daemon v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    info!("Loading the configuration from {}.", args.config.display());
    let source = FileSource::new(args.config, args.bind);
    let engine = Arc::new(Engine::new(source.clone(), source));
    engine
        .reload()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to load the configuration")?;

    let bind = engine.config().bind;
    let listener =
        TcpListener::bind(bind).with_context(|| format!("failed to bind {}", bind))?;
    info!("Set-up is complete; listening on {}.", bind);

    {
        let engine = engine.clone();
        thread::spawn(move || accept_loop(listener, engine));
    }

    // Process incoming signals.
    let mut signals =
        Signals::new([SIGHUP, SIGINT, SIGTERM]).context("failed to set up signal handling")?;
    for signal in signals.forever() {
        match signal {
            s @ (SIGINT | SIGTERM) => {
                let name = match s {
                    SIGINT => "SIGINT",
                    SIGTERM => "SIGTERM",
                    _ => unreachable!(),
                };
                info!("Received {}; shutting down.", name);
                break;
            }
            SIGHUP => {
                info!("Received SIGHUP; reloading the configuration and modules.");
                match engine.reload() {
                    Ok(()) => info!("Reload complete."),
                    Err(e) => error!("Failed to reload (keeping the previous set): {}", e),
                }
            }
            _ => unreachable!(),
        }
    }
    Ok(())
}

fn accept_loop(listener: TcpListener, engine: Arc<Engine>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let engine = engine.clone();
                thread::spawn(move || {
                    let peer = stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|_| String::from("<unknown>"));
                    if let Err(e) = serve_connection(&engine, stream) {
                        debug!("Connection from {} ended: {:#}", peer, e);
                    }
                });
            }
            Err(e) => warn!("Failed to accept a connection: {}", e),
        }
    }
}

/// Serves one connection: one query message in, one response message
/// out, per frame, until the peer hangs up.
fn serve_connection(engine: &Engine, mut stream: TcpStream) -> Result<()> {
    loop {
        let mut header = [0; 4];
        match stream.read_exact(&mut header) {
            Ok(()) => (),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e).context("failed to read a frame header"),
        }
        let length = u32::from_be_bytes(header) as usize;
        if length > MAX_FRAME {
            bail!("refusing a {}-byte frame", length);
        }

        let mut body = vec![0; length];
        stream
            .read_exact(&mut body)
            .context("failed to read a request frame")?;
        let query: Message =
            serde_json::from_slice(&body).context("failed to decode a request")?;

        let response = engine.answer(&query);

        let body = serde_json::to_vec(&response).context("failed to encode the response")?;
        stream
            .write_all(&(body.len() as u32).to_be_bytes())
            .context("failed to write the response")?;
        stream
            .write_all(&body)
            .context("failed to write the response")?;
    }
}
