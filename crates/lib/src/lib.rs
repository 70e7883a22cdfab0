//! weatherbot core library: configuration, Telegram channel, OpenWeather lookup and the
//! polling loop that ties them together. Used by the `weatherbot` CLI.

pub mod bot;
pub mod channels;
pub mod config;
pub mod init;
pub mod weather;
