//! kazky core: a bounded-concurrency batch executor and the tale downloader built on it.

pub mod config;
pub mod logging;

pub mod batch;
pub mod fetch;
pub mod manifest;
pub mod storage;
pub mod tagging;
pub mod tales;
