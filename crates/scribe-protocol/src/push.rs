/// What a push of a small change to a hosting service prints before its
/// `To <url>` line.
pub const PUSH_SUMMARY: &str = "\
Enumerating objects: 5, done.
Counting objects: 100% (5/5), done.
Delta compression using up to 8 threads
Compressing objects: 100% (2/2), done.
Writing objects: 100% (3/3), 297 bytes | 297.00 KiB/s, done.
Total 3 (delta 1), reused 0 (delta 0), pack-reused 0
";

/// Replace the part of a real push's output that betrays a same-machine
/// push with the fixed summary, followed by `To <remote_url>` and the ref
/// update lines git printed after its own `To` line.
///
/// Output without a `To` line (nothing was pushed) is returned unchanged.
pub fn rewrite_push_output(real: &str, remote_url: &str) -> String {
    let mut lines = real.split_inclusive('\n');
    if !lines.any(|line| line.starts_with("To ")) {
        return real.to_string();
    }
    let rest: String = lines.collect();
    format!("{PUSH_SUMMARY}To {remote_url}\n{rest}")
}
