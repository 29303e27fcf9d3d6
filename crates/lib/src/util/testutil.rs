//! Test utilities for dynbuild-lib.
//!
//! Helpers for standing in for a real toolchain with small shell scripts.

use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// A fake toolchain that records its arguments and stdin, then succeeds.
///
/// Arguments land one per line in `args.txt`, stdin in `stdin.txt`, both in the
/// process working directory. The file named after `-o` is created empty.
#[cfg(unix)]
pub fn recording_tool(dir: &Path, name: &str) -> PathBuf {
  write_script(
    dir,
    name,
    r#"printf '%s\n' "$@" > args.txt
cat > stdin.txt
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then : > "$2"; fi
  shift
done
exit 0"#,
  )
}

/// A fake toolchain that prints `message` on stderr and exits with `code`.
///
/// The message is stored verbatim in `<name>.stderr` next to the script, so
/// quotes and backticks reach stderr untouched.
#[cfg(unix)]
pub fn failing_tool(dir: &Path, name: &str, message: &str, code: i32) -> PathBuf {
  std::fs::write(dir.join(format!("{}.stderr", name)), message).unwrap();
  write_script(
    dir,
    name,
    &format!(
      "cat > /dev/null\ncat \"$(dirname \"$0\")/{}.stderr\" >&2\nexit {}",
      name, code
    ),
  )
}

/// Read the argument lines recorded by [`recording_tool`].
pub fn recorded_args(dir: &Path) -> Vec<String> {
  std::fs::read_to_string(dir.join("args.txt"))
    .unwrap()
    .lines()
    .map(str::to_string)
    .collect()
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use crate::process::{ExitStatus, Process};

  #[test]
  fn failing_tool_keeps_message_verbatim() {
    let temp = tempfile::tempdir().unwrap();
    let message = "error: expected ';'\nundefined reference to `missing'";
    let tool = failing_tool(temp.path(), "fake-cc", message, 4);

    let output = Process::new(&tool).input("int x;").start().unwrap();

    assert_eq!(output.status, ExitStatus::Exited(4));
    assert_eq!(output.stderr_lossy(), message);
  }
}
