use anyhow::{Context, anyhow};
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

fn find_by_name<I>(mut devices: I, target: &str) -> Option<Device>
where
    I: Iterator<Item = Device>,
{
    devices.find(|d| d.name().is_ok_and(|name| name == target))
}

/// Returns the input device with the given name, or the host default when no
/// name is requested.
pub fn get_or_default_input(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = cpal::default_host();
    tracing::debug!(host = ?host.id(), "selecting input device");

    match device_name {
        Some(target) => find_by_name(
            host.input_devices()
                .context("Failed to enumerate input devices")?,
            &target,
        )
        .ok_or_else(|| anyhow!("No input device named {target:?}")),
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow!("No default input device")),
    }
}

/// Returns the output device with the given name, or the host default when
/// no name is requested.
pub fn get_or_default_output(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = cpal::default_host();
    tracing::debug!(host = ?host.id(), "selecting output device");

    match device_name {
        Some(target) => find_by_name(
            host.output_devices()
                .context("Failed to enumerate output devices")?,
            &target,
        )
        .ok_or_else(|| anyhow!("No output device named {target:?}")),
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default output device")),
    }
}
