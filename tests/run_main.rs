use std::time::Duration;

use assert_cmd::Command;
use displacement_sketch::wgpu;

const TIMEOUT_DURATION: Duration = Duration::from_secs(10);

fn has_adapter() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()));
    if adapter.is_none() {
        eprintln!("No GPU adapter available, skipping");
    }
    adapter.is_some()
}

#[test]
fn main_doesnt_panic() -> Result<(), anyhow::Error> {
    if !has_adapter() {
        return Ok(());
    }
    Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .env("HEADLESS", "true")
        .timeout(TIMEOUT_DURATION)
        .assert()
        .success();
    Ok(())
}

#[test]
fn missing_assets_are_not_fatal() -> Result<(), anyhow::Error> {
    if !has_adapter() {
        return Ok(());
    }
    Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .env("HEADLESS", "true")
        .env("SKETCH_ASSETS_DIR", "/nonexistent/assets")
        .timeout(TIMEOUT_DURATION)
        .assert()
        .success();
    Ok(())
}
