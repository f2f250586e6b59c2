//! CLI module for the Record Lookup Gateway
//!
//! - `serve`: HTTP server
//! - `lookup`: one-shot lookup through the same cache and store

pub mod lookup;
pub mod serve;

use clap::{Parser, Subcommand};

/// Record Lookup Gateway - cached point lookups over a document store
#[derive(Parser)]
#[command(name = "record-lookup-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Look up a single key and print the outcome as JSON
    Lookup(lookup::LookupArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheBackend, StoreBackend};

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["record-lookup-gateway", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::try_parse_from(["record-lookup-gateway", "lookup", "volcano-42"]).unwrap();

        match cli.command {
            Command::Lookup(args) => assert_eq!(args.key, "volcano-42"),
            _ => panic!("expected lookup command"),
        }
    }

    #[test]
    fn test_parse_lookup_backend_overrides() {
        let cli = Cli::try_parse_from([
            "record-lookup-gateway",
            "lookup",
            "volcano-42",
            "--cache-backend",
            "memory",
            "--store-backend",
            "PG",
        ])
        .unwrap();

        match cli.command {
            Command::Lookup(args) => {
                assert_eq!(args.cache_backend, Some(CacheBackend::InMemory));
                assert_eq!(args.store_backend, Some(StoreBackend::Postgres));
            }
            _ => panic!("expected lookup command"),
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Cli::try_parse_from([
            "record-lookup-gateway",
            "lookup",
            "volcano-42",
            "--store-backend",
            "mongo",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_requires_key() {
        assert!(Cli::try_parse_from(["record-lookup-gateway", "lookup"]).is_err());
    }
}
