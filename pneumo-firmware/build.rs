//! Build script for pneumo-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml and compiles it into the firmware

use std::env;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use pneumo_core::config::BoardConfig;

fn main() {
    setup_linker();
    let config = load_board_config();
    generate_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate board.toml
fn load_board_config() -> BoardConfig {
    // Re-run if board.toml changes
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml configuration file.          ║\n\
            ║  Please create one in the pneumo-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse TOML straight into the board config types
    let config: BoardConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid board.toml                                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format_error_lines(&format!("• {}", e))
        );
    }

    println!("cargo:warning=board.toml validated successfully");
    config
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a float so it reads back as an `f32` literal
fn float(value: f32) -> String {
    format!("{:?}_f32", value)
}

fn float_array(values: &[f32]) -> String {
    let items: Vec<String> = values.iter().map(|v| float(*v)).collect();
    format!("[{}]", items.join(", "))
}

/// Write `board_config.rs` holding the validated configuration as a const
fn generate_config(config: &BoardConfig) {
    let cal = &config.calibration;
    let reg = &config.regulation;
    let sampling = &config.sampling;

    let mut code = String::new();
    writeln!(code, "// Generated from board.toml by build.rs").unwrap();
    writeln!(code, "pub const BOARD_CONFIG: BoardConfig = BoardConfig {{").unwrap();
    writeln!(code, "    calibration: CalibrationConfig {{").unwrap();
    writeln!(code, "        adc_max: {},", cal.adc_max).unwrap();
    writeln!(code, "        full_scale_mv: {},", cal.full_scale_mv).unwrap();
    writeln!(code, "        scale_kpa_per_v: {},", float(cal.scale_kpa_per_v)).unwrap();
    writeln!(code, "        input_offsets_v: {},", float_array(&cal.input_offsets_v)).unwrap();
    writeln!(code, "        output_offsets_v: {},", float_array(&cal.output_offsets_v)).unwrap();
    writeln!(code, "    }},").unwrap();
    writeln!(code, "    regulation: RegulationConfig {{").unwrap();
    writeln!(code, "        enabled: {},", reg.enabled).unwrap();
    writeln!(code, "        duty: {},", reg.duty).unwrap();
    writeln!(code, "        hysteresis_kpa: {},", float(reg.hysteresis_kpa)).unwrap();
    writeln!(code, "    }},").unwrap();
    writeln!(code, "    sampling: SamplingConfig {{").unwrap();
    writeln!(code, "        period_ms: {},", sampling.period_ms).unwrap();
    writeln!(code, "        mux_settle_us: {},", sampling.mux_settle_us).unwrap();
    writeln!(code, "        filter_alpha: {},", float(sampling.filter_alpha)).unwrap();
    writeln!(code, "    }},").unwrap();
    writeln!(code, "    serial: SerialConfig {{").unwrap();
    writeln!(code, "        baud: {},", config.serial.baud).unwrap();
    writeln!(code, "    }},").unwrap();
    writeln!(code, "}};").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("board_config.rs"), code).unwrap();
}
