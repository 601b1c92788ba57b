//! Mesh-network and provisioning-platform reachability checks.

use crate::core::check::{Check, Outcome};
use crate::core::context::ENV_PROXMOX_ENDPOINT;
use crate::core::exec::{self, ExecOptions};

/// Tailscale backend must be up for node bootstrap to work.
pub fn mesh_check() -> Check {
    Check::new(
        "mesh-status",
        "Tailscale mesh connected",
        &["preflight", "network"],
        |_ctx| {
            let out = exec::execute(
                "tailscale",
                &["status", "--json"],
                &ExecOptions::unchecked(),
            )?;
            if out.failed {
                return Ok(Outcome::fail("tailscale status failed")
                    .with_detail(out.stderr.trim().to_string()));
            }
            let status: serde_json::Value = serde_json::from_str(&out.stdout)
                .map_err(|e| crate::core::error::LabError::Parse(e.to_string()))?;
            let backend = status["BackendState"].as_str().unwrap_or("unknown");
            if backend == "Running" {
                Ok(Outcome::pass("mesh backend running"))
            } else {
                Ok(Outcome::warn(format!("mesh backend state: {}", backend)))
            }
        },
    )
}

/// Probe the Proxmox API version endpoint with a short timeout.
pub fn proxmox_check() -> Check {
    Check::new(
        "proxmox-api",
        "Proxmox API reachable",
        &["preflight", "network"],
        |ctx| {
            let Some(endpoint) = ctx.get(ENV_PROXMOX_ENDPOINT) else {
                return Ok(Outcome::warn(
                    "Proxmox endpoint not configured (set LABCTL_PROXMOX_ENDPOINT)",
                ));
            };
            let url = format!("{}/api2/json/version", endpoint.trim_end_matches('/'));
            let out = exec::execute(
                "curl",
                &["-sk", "--max-time", "5", "-o", "/dev/null", url.as_str()],
                &ExecOptions::unchecked(),
            )?;
            if out.failed {
                return Ok(Outcome::fail(format!("no response from {}", endpoint))
                    .with_detail(out.stderr.trim().to_string()));
            }
            Ok(Outcome::pass(format!("{} responded", endpoint)))
        },
    )
}

pub fn checks() -> Vec<Check> {
    vec![mesh_check(), proxmox_check()]
}
