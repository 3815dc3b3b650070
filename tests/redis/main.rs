mod commands;
mod concurrent_blpop;
mod integration_tests;
mod rdb;
