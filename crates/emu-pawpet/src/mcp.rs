//! MCP (Model Context Protocol) server for the PawPet.
//!
//! Exposes the device as a JSON-RPC 2.0 server over stdin/stdout. Tools
//! let agents and scripts boot it, stream assets, drive input, and
//! observe or capture its screen.

#![allow(clippy::redundant_closure_for_method_calls)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use emu_core::Observable;

use crate::capture;
use crate::config::PawPetConfig;
use crate::error::PawPetError;
use crate::host;
use crate::input::PawButton;
use crate::{DISPLAY_HEIGHT, DISPLAY_WIDTH, PawPet};

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: JsonValue,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcResponse {
    fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }

    /// Map a device error onto a JSON-RPC error object.
    fn device_error(id: JsonValue, err: &PawPetError) -> Self {
        let code = match err {
            PawPetError::InvalidAsset { .. } => -32602,
            PawPetError::NotReady { .. } => -32001,
            PawPetError::NotFound(_) | PawPetError::CorruptAsset { .. } => -32000,
        };
        Self::error(id, code, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// MCP Server
// ---------------------------------------------------------------------------

/// Methods that need a booted device.
const METHODS: &[&str] = &[
    "status",
    "load_file",
    "set_buttons",
    "set_battery",
    "tick",
    "run_frames",
    "input_sequence",
    "screenshot",
    "query",
    "save_data",
];

/// MCP server wrapping a headless PawPet.
pub struct McpServer {
    pet: Option<PawPet>,
    config: PawPetConfig,
    assets_dir: Option<PathBuf>,
}

impl McpServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pet: None,
            config: PawPetConfig::default(),
            assets_dir: None,
        }
    }

    /// Default asset directory for `boot` (from CLI `--assets`).
    pub fn set_assets_dir(&mut self, path: PathBuf) {
        self.assets_dir = Some(path);
    }

    /// Default configuration for `boot` (from CLI `--config`).
    pub fn set_config(&mut self, config: PawPetConfig) {
        self.config = config;
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses to stdout.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<RpcRequest>(line) {
                Ok(request) if request.jsonrpc != "2.0" => RpcResponse::error(
                    request.id,
                    -32600,
                    "Invalid JSON-RPC version".to_string(),
                ),
                Ok(request) => self.dispatch(&request.method, &request.params, request.id),
                Err(e) => RpcResponse::error(JsonValue::Null, -32700, format!("Parse error: {e}")),
            };
            write_response(&mut stdout, &response);
        }
    }

    fn dispatch(&mut self, method: &str, params: &JsonValue, id: JsonValue) -> RpcResponse {
        if method == "boot" {
            return self.handle_boot(params, id);
        }
        if !METHODS.contains(&method) {
            return RpcResponse::error(id, -32601, format!("Unknown method: {method}"));
        }
        let Some(pet) = self.pet.as_mut() else {
            return RpcResponse::error(
                id,
                -32000,
                "No PawPet instance. Call 'boot' first.".to_string(),
            );
        };

        match method {
            "status" => Self::handle_status(pet, id),
            "load_file" => Self::handle_load_file(pet, params, id),
            "set_buttons" => Self::handle_set_buttons(pet, params, id),
            "set_battery" => Self::handle_set_battery(pet, params, id),
            "tick" => Self::handle_run_frames(pet, &serde_json::json!({"count": 1}), id),
            "run_frames" => Self::handle_run_frames(pet, params, id),
            "input_sequence" => Self::handle_input_sequence(pet, params, id),
            "screenshot" => Self::handle_screenshot(pet, id),
            "query" => Self::handle_query(pet, params, id),
            _ => Self::handle_save_data(pet, id),
        }
    }

    // === Tool handlers ===

    fn handle_boot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let config = match params.get("config") {
            Some(cfg) => match serde_json::from_value::<PawPetConfig>(cfg.clone()) {
                Ok(c) => c,
                Err(e) => return RpcResponse::error(id, -32602, format!("Invalid config: {e}")),
            },
            None => self.config.clone(),
        };

        let mut pet = PawPet::with_config(config);
        let dir = params
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .or_else(|| self.assets_dir.clone());
        let loaded = match dir {
            Some(dir) => match host::load_asset_dir(&mut pet, &dir) {
                Ok(names) => names,
                Err(e) => {
                    return RpcResponse::error(id, -32000, format!("Cannot load assets: {e}"));
                }
            },
            None => Vec::new(),
        };

        let result = serde_json::json!({
            "status": "ok",
            "loaded": loaded,
            "ready": pet.is_ready(),
            "missing": pet.missing_assets(),
        });
        self.pet = Some(pet);
        RpcResponse::success(id, result)
    }

    fn handle_status(pet: &PawPet, id: JsonValue) -> RpcResponse {
        RpcResponse::success(
            id,
            serde_json::json!({
                "lifecycle": pet.lifecycle().name(),
                "missing": pet.missing_assets(),
                "frame_count": pet.frame_count(),
                "framerate_ms": pet.framerate_ms(),
                "scene": pet.scene().name(),
                "sleeping": pet.is_sleeping(),
            }),
        )
    }

    fn handle_load_file(pet: &mut PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return RpcResponse::error(id, -32602, "Missing 'name' parameter".to_string());
        };

        let data = if let Some(b64) = params.get("data").and_then(|v| v.as_str()) {
            match base64::engine::general_purpose::STANDARD.decode(b64) {
                Ok(d) => d,
                Err(e) => return RpcResponse::error(id, -32602, format!("Invalid base64: {e}")),
            }
        } else if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
            match std::fs::read(path) {
                Ok(d) => d,
                Err(e) => return RpcResponse::error(id, -32602, format!("Cannot read file: {e}")),
            }
        } else {
            return RpcResponse::error(id, -32602, "Provide 'data' (base64) or 'path'".to_string());
        };

        match pet.load_file(&data, name) {
            Ok(()) => RpcResponse::success(
                id,
                serde_json::json!({
                    "name": name,
                    "bytes": data.len(),
                    "ready": pet.is_ready(),
                }),
            ),
            Err(e) => RpcResponse::device_error(id, &e),
        }
    }

    fn handle_set_buttons(pet: &mut PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let mask = if let Some(mask) = params.get("mask").and_then(|v| v.as_u64()) {
            match u8::try_from(mask) {
                Ok(m) => m,
                Err(_) => {
                    return RpcResponse::error(id, -32602, "'mask' must be 0-255".to_string());
                }
            }
        } else if let Some(names) = params.get("buttons").and_then(|v| v.as_array()) {
            let mut mask = 0u8;
            for name in names {
                let name = name.as_str().unwrap_or_default();
                match PawButton::from_name(name) {
                    Some(button) => mask |= button.mask(),
                    None => return RpcResponse::error(id, -32602, format!("Unknown button: {name}")),
                }
            }
            mask
        } else {
            return RpcResponse::error(
                id,
                -32602,
                "Provide 'mask' (0-255) or 'buttons' (array of names)".to_string(),
            );
        };

        pet.set_buttons(mask);
        RpcResponse::success(id, serde_json::json!({"mask": mask}))
    }

    fn handle_set_battery(pet: &mut PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(level) = params.get("level").and_then(|v| v.as_f64()) else {
            return RpcResponse::error(id, -32602, "Missing 'level' parameter".to_string());
        };
        pet.set_battery(level);
        RpcResponse::success(id, serde_json::json!({"level": pet.latch().battery()}))
    }

    fn handle_run_frames(pet: &mut PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let count = params
            .get("count")
            .and_then(|v| v.as_u64())
            .or_else(|| params.get("frames").and_then(|v| v.as_u64()))
            .unwrap_or(1);

        let mut total_ticks = 0u64;
        for _ in 0..count {
            match pet.tick() {
                Ok(ticks) => total_ticks += ticks,
                Err(e) => return RpcResponse::device_error(id, &e),
            }
        }

        RpcResponse::success(
            id,
            serde_json::json!({
                "frames": count,
                "ticks": total_ticks,
                "frame_count": pet.frame_count(),
            }),
        )
    }

    fn handle_input_sequence(pet: &mut PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(sequence) = params.get("sequence").and_then(|v| v.as_array()) else {
            return RpcResponse::error(
                id,
                -32602,
                "Missing 'sequence' array parameter".to_string(),
            );
        };

        let hold_frames = params
            .get("hold_frames")
            .and_then(|v| v.as_u64())
            .unwrap_or(3);

        let gap_frames = params
            .get("gap_frames")
            .and_then(|v| v.as_u64())
            .unwrap_or(3);

        let start_frame = params
            .get("at_frame")
            .and_then(|v| v.as_u64())
            .unwrap_or_else(|| pet.frame_count());

        let mut frame = start_frame;
        let mut count = 0u64;

        for name in sequence.iter().filter_map(|item| item.as_str()) {
            if let Some(button) = PawButton::from_name(name) {
                pet.input_queue().enqueue_button(button, frame, hold_frames);
                frame += hold_frames + gap_frames;
                count += 1;
            }
        }

        RpcResponse::success(
            id,
            serde_json::json!({
                "buttons_queued": count,
                "start_frame": start_frame,
                "end_frame": frame,
            }),
        )
    }

    fn handle_screenshot(pet: &PawPet, id: JsonValue) -> RpcResponse {
        match capture::encode_png(pet) {
            Ok(png) => RpcResponse::success(
                id,
                serde_json::json!({
                    "format": "png",
                    "width": DISPLAY_WIDTH,
                    "height": DISPLAY_HEIGHT,
                    "data": base64::engine::general_purpose::STANDARD.encode(&png),
                }),
            ),
            Err(e) => RpcResponse::error(id, -32000, format!("PNG encode error: {e}")),
        }
    }

    fn handle_query(pet: &PawPet, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(path) = params.get("path").and_then(|v| v.as_str()) else {
            let all = observable_to_json(&pet.query_all());
            return RpcResponse::success(id, all);
        };

        match pet.query(path) {
            Some(value) => {
                let json_val = observable_to_json(&value);
                RpcResponse::success(id, serde_json::json!({"path": path, "value": json_val}))
            }
            None => RpcResponse::error(id, -32000, format!("Unknown query path: {path}")),
        }
    }

    fn handle_save_data(pet: &PawPet, id: JsonValue) -> RpcResponse {
        let data = pet
            .save_data()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));
        RpcResponse::success(id, serde_json::json!({"data": data}))
    }

    /// Run a script file: read a JSON array of simplified RPC requests, dispatch
    /// each in order, and write JSON-line responses to stdout.
    pub fn run_script(&mut self, path: &Path) -> io::Result<()> {
        let data = std::fs::read_to_string(path)?;
        let steps: Vec<ScriptStep> = serde_json::from_str(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for (i, step) in steps.iter().enumerate() {
            let id = JsonValue::from(i as u64 + 1);
            let params = step
                .params
                .clone()
                .unwrap_or_else(|| JsonValue::Object(serde_json::Map::new()));
            let response = self.dispatch(&step.method, &params, id);

            write_response(&mut stdout, &response);

            let save_path = params.get("save_path").and_then(|v| v.as_str());
            let data_b64 = response
                .result
                .as_ref()
                .and_then(|r| r.get("data"))
                .and_then(|v| v.as_str());
            if let (Some(save_path), Some(data_b64)) = (save_path, data_b64) {
                match save_capture_data(save_path, data_b64) {
                    Ok(()) => tracing::info!(path = save_path, "saved capture"),
                    Err(e) => tracing::warn!(path = save_path, error = %e, "failed to save capture"),
                }
            }
        }

        Ok(())
    }
}

/// Write one response as a JSON line.
fn write_response(out: &mut impl Write, response: &RpcResponse) {
    let line = serde_json::to_string(response).unwrap_or_default();
    if writeln!(out, "{line}").and_then(|()| out.flush()).is_err() {
        tracing::debug!("response dropped, stdout closed");
    }
}

/// A single step in a script file.
#[derive(Deserialize)]
struct ScriptStep {
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

/// Decode base64 capture data and write to a file.
fn save_capture_data(path: &str, data_b64: &str) -> io::Result<()> {
    if data_b64.is_empty() {
        return Ok(());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data_b64)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, bytes)
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn observable_to_json(value: &emu_core::Value) -> JsonValue {
    match value {
        emu_core::Value::U8(v) => serde_json::json!(v),
        emu_core::Value::U16(v) => serde_json::json!(v),
        emu_core::Value::U32(v) => serde_json::json!(v),
        emu_core::Value::U64(v) => serde_json::json!(v),
        emu_core::Value::Bool(v) => serde_json::json!(v),
        emu_core::Value::String(v) => serde_json::json!(v),
        emu_core::Value::Array(v) => v.iter().map(observable_to_json).collect(),
        emu_core::Value::Map(v) => v
            .iter()
            .map(|(k, v)| (k.clone(), observable_to_json(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_paw::{Frame, Texel};

    fn sheet_b64() -> String {
        let bytes = format_paw::encode(&[Frame::new(8, 8, vec![Texel::On; 64])]).expect("encode");
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn booted() -> McpServer {
        let mut server = McpServer::new();
        let resp = server.dispatch("boot", &JsonValue::Null, JsonValue::from(1));
        assert!(resp.error.is_none());
        for name in ["battery", "petsit", "icons", "sleeptest"] {
            let resp = server.dispatch(
                "load_file",
                &serde_json::json!({"name": name, "data": sheet_b64()}),
                JsonValue::from(2),
            );
            assert!(resp.error.is_none(), "load {name}");
        }
        server
    }

    fn code(resp: &RpcResponse) -> Option<i32> {
        resp.error.as_ref().map(|e| e.code)
    }

    #[test]
    fn unknown_method_returns_error() {
        let mut server = McpServer::new();
        let resp = server.dispatch("nonexistent", &JsonValue::Null, JsonValue::from(1));
        assert_eq!(code(&resp), Some(-32601));
    }

    #[test]
    fn run_frames_without_boot_returns_error() {
        let mut server = McpServer::new();
        let resp = server.dispatch(
            "run_frames",
            &serde_json::json!({"count": 1}),
            JsonValue::from(1),
        );
        assert_eq!(code(&resp), Some(-32000));
    }

    #[test]
    fn tick_before_assets_is_not_ready() {
        let mut server = McpServer::new();
        server.dispatch("boot", &JsonValue::Null, JsonValue::from(1));
        let resp = server.dispatch("tick", &JsonValue::Null, JsonValue::from(2));
        assert_eq!(code(&resp), Some(-32001));
    }

    #[test]
    fn bad_sheet_is_invalid_params() {
        let mut server = McpServer::new();
        server.dispatch("boot", &JsonValue::Null, JsonValue::from(1));
        let resp = server.dispatch(
            "load_file",
            &serde_json::json!({"name": "icons", "data": "AAAA"}),
            JsonValue::from(2),
        );
        assert_eq!(code(&resp), Some(-32602));
    }

    #[test]
    fn booted_server_runs_and_reports() {
        let mut server = booted();
        let resp = server.dispatch(
            "set_buttons",
            &serde_json::json!({"buttons": ["down"]}),
            JsonValue::from(3),
        );
        assert_eq!(resp.result, Some(serde_json::json!({"mask": 0x40})));

        let resp = server.dispatch(
            "run_frames",
            &serde_json::json!({"count": 4}),
            JsonValue::from(4),
        );
        let result = resp.result.expect("ran");
        assert_eq!(result["ticks"], 132);
        assert_eq!(result["frame_count"], 4);

        let resp = server.dispatch(
            "query",
            &serde_json::json!({"path": "menu.selection"}),
            JsonValue::from(5),
        );
        assert_eq!(resp.result.expect("value")["value"], 1);

        let resp = server.dispatch("screenshot", &JsonValue::Null, JsonValue::from(6));
        assert_eq!(resp.result.expect("png")["format"], "png");
    }

    #[test]
    fn query_without_path_returns_every_value() {
        let mut server = booted();
        let resp = server.dispatch("query", &JsonValue::Null, JsonValue::from(1));
        let all = resp.result.expect("all");
        assert_eq!(all["lifecycle"], "ready");
        assert!(all["assets.names"].is_array());
    }

    #[test]
    fn battery_is_clamped_through_rpc() {
        let mut server = booted();
        let resp = server.dispatch(
            "set_battery",
            &serde_json::json!({"level": 150}),
            JsonValue::from(1),
        );
        assert_eq!(resp.result.expect("set")["level"], 100);
    }

    #[test]
    fn mask_out_of_range_is_rejected() {
        let mut server = booted();
        let resp = server.dispatch(
            "set_buttons",
            &serde_json::json!({"mask": 300}),
            JsonValue::from(1),
        );
        assert_eq!(code(&resp), Some(-32602));
    }
}
