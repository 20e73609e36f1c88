//! # essentials - command-line tool for essentials location data
//!
//! Reads and edits the `warp.json`, `home.json` and `hub.json` files of an
//! essentials data directory while the server is offline, through the same
//! stores the plugin uses at runtime.
//!
//! ```bash
//! # Validate configuration and data files
//! essentials check
//!
//! # List warps of another installation
//! essentials --config /srv/mc/plugins/essentials/essentials.toml warp list
//!
//! # Add a warp
//! essentials warp add Spawn --world world --x 0.5 --y 64 --z 0.5
//!
//! # Homes are per player
//! essentials home --player 5f1c3c2e-8a53-4d36-86f4-2f1a9a0b6f10 list
//! ```

pub mod app;
pub mod cli;
pub mod logging;
