// Library root
// ------------
// This crate exposes the client library behind the `snakekv` CLI. The
// binary (`main.rs`) parses flags, sets up logging and hands a configured
// client to the interactive menu.
//
// Module responsibilities:
// - `entry` / `batch`: the values that write operations send, validated
//   and deduplicated before any request is built.
// - `transport`: one blocking HTTP exchange per call (reqwest), behind a
//   trait so the client can run against a fake.
// - `outcome`: turns every answered or failed call into a `RequestOutcome`.
// - `api`: the client itself, one method per backend endpoint.
// - `config`: defaults, config file, environment and flag layering.
// - `display`: tables, timestamps and JSON/YAML export for fetched records.
// - `ui`: the terminal menu flows.
pub mod api;
pub mod batch;
pub mod config;
pub mod display;
pub mod entry;
pub mod outcome;
pub mod transport;
pub mod ui;

pub use api::KvClient;
pub use batch::Batch;
pub use entry::{KeyValueEntry, ValidationError};
pub use outcome::{RequestOutcome, StoredRecord};
