//! Command batches executed on the target host.

use crate::config::CaptureConfig;

/// Batch that acquires a raw memory image on the target and uploads it
/// straight to the evidence store.
///
/// Every verification step exits non-zero on failure, which surfaces as an
/// execution failure for the whole batch. The free-space check compares the
/// dump volume against MemTotal: the image is RAM-sized and uncompressed, so
/// a tmpfs-backed path can never hold it.
pub fn memory_capture_batch(
    capture: &CaptureConfig,
    dump_path: &str,
    destination: &str,
) -> Vec<String> {
    vec![
        "echo '[capture] starting memory acquisition'".to_string(),
        format!(
            "CAPTURE_MODULE=$(ls {}/*.ko 2>/dev/null | head -1)",
            capture.module_dir
        ),
        format!(
            "if [ -z \"$CAPTURE_MODULE\" ]; then echo 'ERROR: capture module not found in {}'; exit 1; fi",
            capture.module_dir
        ),
        "echo \"[capture] module found: $CAPTURE_MODULE\"".to_string(),
        // A stale load from a previous run makes insmod fail with EEXIST.
        format!(
            "if lsmod | grep -q '^{0}'; then echo '[capture] module already loaded, unloading'; rmmod {0}; fi",
            capture.module_name
        ),
        format!("AVAIL_KB=$(df {} --output=avail | tail -1)", capture.dump_dir),
        "RAM_KB=$(grep MemTotal /proc/meminfo | awk '{print $2}')".to_string(),
        format!(
            "if [ \"$AVAIL_KB\" -lt \"$RAM_KB\" ]; then echo \"ERROR: not enough space in {} (${{AVAIL_KB}}KB available, ${{RAM_KB}}KB needed)\"; exit 1; fi",
            capture.dump_dir
        ),
        "echo \"[capture] free space: ${AVAIL_KB}KB | total RAM: ${RAM_KB}KB\"".to_string(),
        format!(
            "insmod $CAPTURE_MODULE 'path={dump_path} format={}'",
            capture.format
        ),
        format!("if [ ! -s {dump_path} ]; then echo 'ERROR: dump missing or empty: {dump_path}'; exit 1; fi"),
        format!("echo '[capture] acquisition complete: {dump_path}'"),
        format!("ls -lh {dump_path}"),
        // Unload after the dump to release the kernel.
        format!("rmmod {} || true", capture.module_name),
        format!("echo '[upload] copying to {destination}'"),
        format!("{} {dump_path} {destination}", capture.upload_command),
        "echo '[upload] complete'".to_string(),
        format!("rm -f {dump_path}"),
        "echo '[cleanup] local dump removed'".to_string(),
    ]
}

/// Read-only OS introspection batch. Each section is prefixed with a labeled
/// marker line so the combined stdout splits unambiguously.
pub fn os_introspection_batch() -> Vec<String> {
    [
        ("HOSTNAME", "hostname -f"),
        ("UNAME", "uname -a"),
        ("UPTIME", "uptime"),
        ("WHO", "who"),
        ("PS AUX (top 50)", "ps aux --sort=-%mem | head -50"),
        ("NETSTAT", "ss -tunapl 2>/dev/null || netstat -tunapl 2>/dev/null"),
        ("ROUTES", "ip route show"),
        ("IPTABLES", "iptables -L -n 2>/dev/null || echo 'no permission'"),
        ("CRONTAB ROOT", "crontab -l 2>/dev/null || echo 'empty'"),
        ("LAST LOGINS", "last -20"),
        ("/etc/passwd (last 10 lines)", "tail -10 /etc/passwd"),
        ("KERNEL MODULES", "lsmod"),
    ]
    .iter()
    .map(|(label, command)| format!("echo '=== {label} ===' && {command}"))
    .collect()
}
