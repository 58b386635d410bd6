//! Compiled-in board configuration
//!
//! `board.toml` is validated and turned into Rust by the build script.

use pneumo_core::config::{
    BoardConfig, CalibrationConfig, RegulationConfig, SamplingConfig, SerialConfig,
};

include!(concat!(env!("OUT_DIR"), "/board_config.rs"));
