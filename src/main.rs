#![warn(clippy::pedantic)]

mod auth;
mod config;
mod error;
mod extract;
mod model;
mod ratelimit;
mod route;
mod session;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::digest::{CredentialDigest, Md5Credential};
use auth::token::TokenCodec;
use config::Config;
use store::Store;

pub use error::Error;

pub type AppState = State;

/// The shared application state.
///
/// Everything handlers need: the persistence collaborator, the token
/// codec, the credential digest and the runtime configuration.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: Store,
	pub tokens: TokenCodec,
	pub digest: Arc<dyn CredentialDigest>,
	pub config: Arc<Config>,
}

fn app(state: State) -> Router {
	Router::new()
		.nest("/api/auth", route::auth::routes())
		.nest("/api/users", route::user::routes())
		.nest("/api/projects", route::project::routes())
		.nest("/api/forum", route::forum::routes())
		.nest("/api/messages", route::message::routes())
		.nest("/api/admin", route::admin::routes())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.init();

	let config = Config::from_env();

	let state = State {
		store: Store::in_memory(),
		tokens: TokenCodec::new(&config.token_secret, config.token_ttl),
		digest: Arc::new(Md5Credential),
		config: Arc::new(config.clone()),
	};

	let governor = ratelimit::default();
	ratelimit::cleanup_old_limits(&[&governor]);

	let app = app(state).layer(GovernorLayer { config: governor });

	let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", config.port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await
	.expect("server error");
}
