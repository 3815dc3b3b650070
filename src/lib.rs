//! An in-memory key-value server speaking the Redis protocol (RESP).
//!
//! Supported:
//!
//! - strings with expiry, lists, streams and sorted sets
//! - blocking reads (BLPOP, XREAD BLOCK) woken through a topic broker
//! - publish/subscribe channels
//! - MULTI/EXEC/DISCARD transactions
//! - master-replica replication with WAIT
//! - loading an RDB snapshot at startup

pub mod commands;
pub mod config;
pub mod connection;
pub mod key_value_store;
pub mod pubsub;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod state;
