//! termdeck: markdown slide decks in the terminal, with spring-animated
//! transitions and live reload.

pub mod app;
pub mod cli;
pub mod config;
pub mod deck;
pub mod error;
pub mod logging;
pub mod messages;
pub mod parser;
pub mod render;
pub mod style;
pub mod terminal;
pub mod theme;
pub mod transition;
pub mod watch;
