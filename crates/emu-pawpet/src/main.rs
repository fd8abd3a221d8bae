//! PawPet emulator binary.
//!
//! Runs the PawPet headless for screenshots and frame dumps, or as an MCP
//! server.

use std::path::PathBuf;
use std::process;

use emu_pawpet::mcp::McpServer;
use emu_pawpet::{PawPet, PawPetConfig, capture, host};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    assets_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    mcp: bool,
    script_path: Option<PathBuf>,
    frames: u32,
    buttons: u8,
    battery: Option<f64>,
    screenshot_path: Option<PathBuf>,
    record_dir: Option<PathBuf>,
    save_out: Option<PathBuf>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        assets_dir: None,
        config_path: None,
        mcp: false,
        script_path: None,
        frames: 200,
        buttons: 0,
        battery: None,
        screenshot_path: None,
        record_dir: None,
        save_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--assets" => {
                i += 1;
                cli.assets_dir = args.get(i).map(PathBuf::from);
            }
            "--config" => {
                i += 1;
                cli.config_path = args.get(i).map(PathBuf::from);
            }
            "--mcp" => {
                cli.mcp = true;
            }
            "--script" => {
                i += 1;
                cli.script_path = args.get(i).map(PathBuf::from);
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--buttons" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.buttons = parse_mask(s).unwrap_or_else(|| {
                        eprintln!("Invalid button mask: {s}");
                        process::exit(1);
                    });
                }
            }
            "--battery" => {
                i += 1;
                cli.battery = args.get(i).and_then(|s| s.parse().ok());
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--record" => {
                i += 1;
                cli.record_dir = args.get(i).map(PathBuf::from);
            }
            "--save-out" => {
                i += 1;
                cli.save_out = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                eprintln!("Usage: emu-pawpet [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --assets <dir>       Directory of *.paw sheets (and save.bin)");
                eprintln!("  --config <file>      JSON device configuration");
                eprintln!("  --mcp                Run as MCP server (JSON-RPC over stdio)");
                eprintln!("  --script <file>      Run a JSON script of RPC calls");
                eprintln!("  --frames <n>         Number of frames to run [default: 200]");
                eprintln!("  --buttons <mask>     Buttons held throughout (e.g. 0x10)");
                eprintln!("  --battery <level>    Battery level 0-100");
                eprintln!("  --screenshot <file>  Save a PNG screenshot after the run");
                eprintln!("  --record <dir>       Record frames to directory");
                eprintln!("  --save-out <file>    Write the save blob after the run");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Parse a mask as decimal, `0x` hex or `0b` binary.
fn parse_mask(s: &str) -> Option<u8> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(bin, 2).ok()
    } else {
        s.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn run_headless(cli: &CliArgs, config: PawPetConfig) {
    let mut pet = make_pet(cli, config);
    pet.set_buttons(cli.buttons);
    if let Some(level) = cli.battery {
        pet.set_battery(level);
    }

    if let Some(ref dir) = cli.record_dir {
        if let Err(e) = capture::record(&mut pet, dir, cli.frames) {
            eprintln!("Record error: {e}");
            process::exit(1);
        }
    } else {
        for _ in 0..cli.frames {
            if let Err(e) = pet.tick() {
                eprintln!("Frame {} failed: {e}", pet.frame_count() + 1);
                process::exit(1);
            }
        }
    }

    if let Some(ref path) = cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&pet, path) {
            eprintln!("Screenshot error: {e}");
            process::exit(1);
        }
        eprintln!("Screenshot saved to {}", path.display());
    }

    if let Some(ref path) = cli.save_out {
        let Some(save) = pet.save_data() else {
            eprintln!("No save data written during the run");
            process::exit(1);
        };
        if let Err(e) = std::fs::write(path, save) {
            eprintln!("Failed to write {}: {e}", path.display());
            process::exit(1);
        }
        eprintln!("Save written to {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn load_config(cli: &CliArgs) -> PawPetConfig {
    let Some(ref path) = cli.config_path else {
        return PawPetConfig::default();
    };
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read config {}: {e}", path.display());
            process::exit(1);
        }
    };
    match PawPetConfig::from_json(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn make_pet(cli: &CliArgs, config: PawPetConfig) -> PawPet {
    let dir = cli.assets_dir.as_ref().unwrap_or_else(|| {
        eprintln!("No asset directory specified. Use --assets <dir>");
        process::exit(1);
    });

    let mut pet = PawPet::with_config(config);
    match host::load_asset_dir(&mut pet, dir) {
        Ok(names) => eprintln!("Loaded {} files from {}", names.len(), dir.display()),
        Err(e) => {
            eprintln!("Failed to load assets from {}: {e}", dir.display());
            process::exit(1);
        }
    }
    if !pet.is_ready() {
        eprintln!("Missing boot assets: {}", pet.missing_assets().join(", "));
        process::exit(1);
    }
    pet
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    init_logging();
    let cli = parse_args();
    let config = load_config(&cli);

    if cli.mcp || cli.script_path.is_some() {
        let mut server = McpServer::new();
        server.set_config(config);
        if let Some(ref path) = cli.assets_dir {
            server.set_assets_dir(path.clone());
        }
        if let Some(ref path) = cli.script_path {
            if let Err(e) = server.run_script(path) {
                eprintln!("Script error: {e}");
                process::exit(1);
            }
            return;
        }
        server.run();
        return;
    }

    run_headless(&cli, config);
}
