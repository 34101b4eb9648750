//! Port name to device path mapping.

/// Prefix for Win32 device namespace paths (`\\.\COM10`).
pub const WINDOWS_DEVICE_PREFIX: &str = r"\\.\";

/// Prefix for unix character devices.
pub const UNIX_DEVICE_PREFIX: &str = "/dev/";

/// Device prefix for the platform this crate was built for.
pub fn default_device_prefix() -> &'static str {
    if cfg!(windows) {
        WINDOWS_DEVICE_PREFIX
    } else {
        UNIX_DEVICE_PREFIX
    }
}

/// Map a short port name such as `COM7` or `ttyUSB0` to a device path.
///
/// Names that already carry a path (`/dev/ttyS0`, `\\.\COM3`) are returned
/// unchanged so callers may pass either form.
pub fn device_path(prefix: &str, port_name: &str) -> String {
    let already_a_path =
        port_name.starts_with('/') || port_name.starts_with(r"\\") || port_name.starts_with(prefix);
    if already_a_path {
        return port_name.to_string();
    }
    format!("{prefix}{port_name}")
}
