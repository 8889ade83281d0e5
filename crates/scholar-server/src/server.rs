//! HTTP server.
//!
//! Accepts HTTP/1.1 connections with hyper, buffers each request body,
//! routes it through the [`RouteTable`] and runs the matched endpoint's
//! pipeline into a [`BufferedResponse`].
//!
//! # Example
//!
//! ```no_run
//! use scholar_auth::{AuthService, MemoryDirectory};
//! use scholar_config::ScholarConfig;
//! use scholar_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScholarConfig::development();
//!     let server = Server::application(&config, AuthService::new(MemoryDirectory::new()))?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use crate::error::{ServerError, ServerResult};
use crate::handlers::{LoginHandler, LogoutHandler, SessionInfoHandler};
use crate::router::{RouteLookup, RouteTable};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::static_files::StaticFiles;
use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use scholar_auth::AuthService;
use scholar_config::ScholarConfig;
use scholar_core::{RequestContext, RouteDescriptor, SessionStore};
use scholar_middleware::{BufferedResponse, Endpoint, Pipeline, Request, Response, ResponseWriter};
use scholar_session::CookieSessionStore;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The Scholar HTTP server.
pub struct Server {
    config: ScholarConfig,
    routes: RouteTable,
    store: Arc<CookieSessionStore>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("http_addr", &self.config.server.http_addr)
            .field("routes", &self.routes)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Builds the server with the account routes and, when enabled, static files.
    ///
    /// | Route        | Pipeline   |
    /// |--------------|------------|
    /// | `POST /login`  | public   |
    /// | `POST /logout` | public   |
    /// | `GET /me`      | standard |
    pub fn application(config: &ScholarConfig, auth: AuthService) -> ServerResult<Self> {
        let store = Arc::new(CookieSessionStore::from_config(&config.session)?);

        let mut builder = Self::builder()
            .config(config.clone())
            .session_store(Arc::clone(&store))
            .endpoint(Endpoint::new(
                RouteDescriptor::new("login", Method::POST, "/login"),
                Pipeline::public(config),
                LoginHandler::new(auth, Arc::clone(&store)),
            ))
            .endpoint(Endpoint::new(
                RouteDescriptor::new("logout", Method::POST, "/logout"),
                Pipeline::public(config),
                LogoutHandler::new(store),
            ))
            .endpoint(Endpoint::new(
                RouteDescriptor::new("session_info", Method::GET, "/me"),
                Pipeline::standard(config),
                SessionInfoHandler,
            ));

        if config.static_files.enabled {
            builder = builder.static_files(StaticFiles::new(
                config.static_files.mount.clone(),
                config.static_files.root.clone(),
            ));
        }
        builder.build()
    }

    /// The configuration the server was built with.
    #[must_use]
    pub fn config(&self) -> &ScholarConfig {
        &self.config
    }

    /// The route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The session store bound into every request.
    #[must_use]
    pub fn session_store(&self) -> &Arc<CookieSessionStore> {
        &self.store
    }

    /// Serves one buffered request.
    ///
    /// Each request gets a fresh context carrying the session store. Unknown
    /// paths get `404 page not found`; known paths with another method get
    /// `405`.
    pub async fn handle(&self, mut request: Request) -> Response {
        let store: Arc<dyn SessionStore> = self.store.clone();
        let ctx = RequestContext::new().with_cookie_store(store);
        let request_id = ctx.request_id();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let mut writer = BufferedResponse::new();

        match self.routes.lookup(&method, &path) {
            RouteLookup::Found { endpoint, params } => {
                request.extensions_mut().insert(params);
                let served = tokio::time::timeout(
                    self.request_timeout,
                    endpoint.serve(ctx.clone(), request, &mut writer),
                )
                .await;
                if served.is_err() {
                    tracing::warn!(request_id = %request_id, http.path = %path, "request timed out");
                    writer = BufferedResponse::new();
                    write_plain(&mut writer, StatusCode::GATEWAY_TIMEOUT);
                }
            }
            RouteLookup::MethodNotAllowed => write_plain(&mut writer, StatusCode::METHOD_NOT_ALLOWED),
            RouteLookup::NotFound => {
                if let Err(e) = writer.write_not_found() {
                    tracing::warn!(error = %e, "failed to write not found response");
                }
            }
        }

        let response = writer.into_response();
        tracing::debug!(
            request_id = %request_id,
            http.method = %method,
            http.path = %path,
            http.status_code = response.status().as_u16(),
            duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
        response
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> ServerResult<()> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr_text = self.config.server.http_addr.clone();
        let addr: SocketAddr = addr_text.parse().map_err(|e: std::net::AddrParseError| {
            ServerError::InvalidAddress {
                addr: addr_text.clone(),
                reason: e.to_string(),
            }
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr_text,
                source,
            })?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` triggers, then
    /// waits for open connections up to the shutdown timeout.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> ServerResult<()> {
        tracing::info!(addr = %listener.local_addr()?, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.track();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(remote = %remote, error = %e, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = Duration::from_secs(server.config.server.shutdown_timeout_secs);
        tracing::info!(
            active = tracker.active(),
            timeout_secs = timeout.as_secs(),
            "waiting for connections to close"
        );
        if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
            tracing::warn!(active = tracker.active(), "shutdown timeout reached");
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let keep_alive = self.config.server.keep_alive;
        let server = Arc::clone(&self);
        let service = service_fn(move |request: hyper::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_incoming(request).await) }
        });

        let conn = http1::Builder::new()
            .keep_alive(keep_alive)
            .serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    async fn handle_incoming(&self, request: hyper::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();
        let collected = tokio::time::timeout(self.request_timeout, body.collect()).await;
        let body: Bytes = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read request body");
                return plain_response(StatusCode::BAD_REQUEST);
            }
            Err(_) => {
                tracing::warn!("request body timed out");
                return plain_response(StatusCode::REQUEST_TIMEOUT);
            }
        };
        self.handle(http::Request::from_parts(parts, Full::new(body)))
            .await
    }
}

fn write_plain(writer: &mut BufferedResponse, status: StatusCode) {
    let reason = status.canonical_reason().unwrap_or("Error");
    if let Err(e) = writer.write_error(status, reason) {
        tracing::warn!(error = %e, "failed to write error response");
    }
}

fn plain_response(status: StatusCode) -> Response {
    let mut writer = BufferedResponse::new();
    write_plain(&mut writer, status);
    writer.into_response()
}

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<ScholarConfig>,
    store: Option<Arc<CookieSessionStore>>,
    endpoints: Vec<Endpoint>,
    mounts: Vec<(String, Endpoint)>,
    static_files: Vec<StaticFiles>,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("endpoints", &self.endpoints.len())
            .field("mounts", &self.mounts.len())
            .field("static_files", &self.static_files)
            .finish_non_exhaustive()
    }
}

impl ServerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration. Defaults to [`ScholarConfig::default`].
    #[must_use]
    pub fn config(mut self, config: ScholarConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the session store. Without one, a store is built from the
    /// `[session]` configuration section.
    #[must_use]
    pub fn session_store(mut self, store: Arc<CookieSessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Adds an endpoint under its route's method and pattern.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Serves every path under `prefix` through `endpoint`.
    #[must_use]
    pub fn mount(mut self, prefix: impl Into<String>, endpoint: Endpoint) -> Self {
        self.mounts.push((prefix.into(), endpoint));
        self
    }

    /// Serves static files under their mount prefix, behind the public pipeline.
    #[must_use]
    pub fn static_files(mut self, files: StaticFiles) -> Self {
        self.static_files.push(files);
        self
    }

    /// Sets the request timeout, applied to body collection and to the
    /// endpoint separately. Defaults to 30 seconds.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Fails on duplicate routes, or when no session store was given and
    /// none can be built from the configuration.
    pub fn build(self) -> ServerResult<Server> {
        let config = self.config.unwrap_or_default();
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(CookieSessionStore::from_config(&config.session)?),
        };

        let mut routes = RouteTable::new();
        for endpoint in self.endpoints {
            routes.add(endpoint)?;
        }
        for (prefix, endpoint) in self.mounts {
            routes.mount(prefix, endpoint);
        }
        for files in self.static_files {
            let prefix = files.mount().to_string();
            let endpoint = Endpoint::new(
                RouteDescriptor::new("static_files", Method::GET, prefix.clone()),
                Pipeline::public(&config),
                files,
            );
            routes.mount(prefix, endpoint);
        }

        Ok(Server {
            config,
            routes,
            store,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }
}
