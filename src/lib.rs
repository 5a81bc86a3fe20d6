// Library surface shared by the terminal binary and the integration tests.
pub mod config;
pub mod game;
pub mod number_parser;
pub mod presentation;
pub mod runtime;
pub mod scoring;
pub mod sequence;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod voice;
