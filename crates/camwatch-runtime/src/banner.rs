//! Startup banner printed to stdout before monitoring begins.

use camwatch_source::HostInfo;

pub fn banner(host: &HostInfo, mobile_sync: bool) -> String {
    let sync = if mobile_sync { "Enabled" } else { "Disabled" };
    format!(
        "camwatch {version}\n\
         Platform: {os} {os_version}\n\
         Device: {device}\n\
         Mobile Sync: {sync}\n\
         Monitoring for webcam access... Press Ctrl+C to stop.",
        version = env!("CARGO_PKG_VERSION"),
        os = host.os_family,
        os_version = host.os_version,
        device = host.device_name,
    )
}
