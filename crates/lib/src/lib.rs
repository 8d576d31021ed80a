//! Charla core library — config, completion client, alert channels, and the
//! relay gateway used by the `charla` CLI.

pub mod alerts;
pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod reply;
