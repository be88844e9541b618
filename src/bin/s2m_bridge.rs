// src/bin/s2m_bridge.rs

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use clap::Parser;
use log::{error, info};

use s2m_bridge::common::timing;
use s2m_bridge::transport::{discover, SerialPortInterface};
use s2m_bridge::{Bridge, BridgeConfig, Gateway, GatewayResponse};

/// Relay Scratch 2 HTTP extension requests to a micro:bit over serial.
#[derive(Parser, Debug)]
#[command(name = "s2m-bridge", version, about)]
struct Args {
    /// Serial port of the micro:bit; probes candidate ports when omitted.
    #[arg(short, long)]
    port: Option<String>,

    /// Address the HTTP extension listener binds to.
    #[arg(short, long, default_value = "127.0.0.1:50209")]
    listen: SocketAddr,

    #[arg(short, long, default_value_t = timing::BAUD_RATE)]
    baud: u32,

    /// How long each startup handshake reply may take, in milliseconds.
    #[arg(long, default_value_t = timing::HANDSHAKE_TIMEOUT.as_millis() as u64)]
    handshake_timeout_ms: u64,

    /// Answer the very first poll with data instead of a bare acknowledgement.
    #[arg(long)]
    no_poll_suppression: bool,
}

impl Args {
    fn config(&self) -> BridgeConfig {
        BridgeConfig {
            baud_rate: self.baud,
            handshake_timeout: Duration::from_millis(self.handshake_timeout_ms),
            suppress_first_poll: !self.no_poll_suppression,
            ..BridgeConfig::default()
        }
    }
}

async fn relay(State(gateway): State<Gateway>, uri: Uri) -> Response {
    let response = gateway.handle(uri.path());
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    (
        status,
        [
            (header::CONTENT_TYPE, GatewayResponse::CONTENT_TYPE),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, GatewayResponse::ALLOW_ORIGIN),
        ],
        response.body,
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = args.config();

    let bridge = match &args.port {
        Some(path) => {
            let interface = SerialPortInterface::open(path, config.baud_rate, config.write_timeout)?;
            Bridge::connect(interface, config)?
        }
        None => {
            info!("Autodetecting serial port, please wait...");
            discover(&config)?
        }
    };

    let running = bridge.spawn()?;
    let app = Router::new()
        .fallback(relay)
        .with_state(running.gateway().clone());

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Listening for Scratch on http://{}", args.listen);
    info!("Press Ctrl-C to exit; save your Scratch project first");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if running.shutdown().is_err() {
        error!("Scheduler thread panicked");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = run(Args::parse()).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
