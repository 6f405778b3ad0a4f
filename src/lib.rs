//! Pokedex - incrementally loaded Pokemon catalog over PokeAPI
//!
//! The library holds the catalog core (aggregation, paging, search) and the
//! tui-dispatch state machine that drives it. The binary adds the terminal UI.

pub mod action;
pub mod aggregator;
pub mod api;
pub mod catalog;
pub mod config;
pub mod effect;
pub mod error;
pub mod loader;
pub mod reducer;
pub mod search;
pub mod state;
