//! Typed client for the Docker Engine remote API.
//!
//! `dockyard` talks HTTP/1.1 to a Docker-compatible daemon over a Unix
//! socket, plain TCP, or TLS. Each daemon operation is a method on
//! [`engine::DockerConnector`] taking a parameter object that validates
//! itself before any connection is opened.
//!
//! # Architecture
//!
//! Every operation opens its own connection, sends one request and releases
//! the connection once the response has been read. Streaming operations
//! (logs, attach, events, exec output, build, pull and push progress) hand
//! the response body to a background pump that decodes messages and delivers
//! them to a caller-supplied sink. A stream can be cancelled from any thread;
//! cancelling closes its connection.
//!
//! # Modules
//!
//! - [`api`]: Multi-step helpers shared by the CLI and embedders
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Connections, requests, parameter objects and stream pumps
//! - [`error`]: Semantic error types for the application

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
