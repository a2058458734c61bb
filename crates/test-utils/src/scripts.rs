//! Shell scripts standing in for a real build tool.
//!
//! The scripts find the marker files through the `BUILDGATE_LOCK_FILE` and
//! `BUILDGATE_ERROR_FILE` variables the supervisor exports, and record
//! their arguments in `args.txt` in their working directory (the app root).

use std::path::{Path, PathBuf};

/// Exit 0 after removing the lock file.
pub const SUCCEED: &str = r#"
echo "$@" > args.txt
echo "building"
echo "warning: something minor" >&2
rm -f "$BUILDGATE_LOCK_FILE"
exit 0
"#;

/// Print a Latin-1 byte, keep writing well past a pipe buffer, then succeed.
pub const NON_UTF8_OUTPUT: &str = r#"
printf 'compiling caf\351.js\n'
i=0
while [ $i -lt 2000 ]; do
  echo "processed module $i"
  i=$((i + 1))
done
rm -f "$BUILDGATE_LOCK_FILE"
exit 0
"#;

/// Write the error file, keep the lock, exit 1.
pub const SYNTAX_ERROR: &str = r#"
echo "$@" > args.txt
echo "SyntaxError: unexpected token" > "$BUILDGATE_ERROR_FILE"
exit 1
"#;

/// Exit non-zero without writing an error file.
pub const CRASH: &str = r#"
echo "$@" > args.txt
echo "Segmentation fault" >&2
exit 3
"#;

/// Watch mode: finish the first build, then stay resident until SIGINT.
pub const WATCH: &str = r#"
echo "$@" > args.txt
trap 'echo interrupted > interrupted.txt; exit 0' INT
rm -f "$BUILDGATE_LOCK_FILE"
while true; do sleep 0.05; done
"#;

/// Watch mode that releases the lock when interrupted, as a tool cleaning up
/// after itself would. Only the first run finishes its build; later runs
/// keep building (and holding the lock) until interrupted.
pub const RESTARTABLE_WATCH: &str = r#"
trap 'rm -f "$BUILDGATE_LOCK_FILE"; exit 0' INT
if [ ! -f started.txt ]; then
  touch started.txt
  rm -f "$BUILDGATE_LOCK_FILE"
fi
while true; do sleep 0.05; done
"#;

/// Watch mode that ignores SIGINT entirely.
pub const STUBBORN_WATCH: &str = r#"
trap '' INT
rm -f "$BUILDGATE_LOCK_FILE"
while true; do sleep 0.05; done
"#;

/// Write an executable `#!/bin/sh` script at `path`.
#[cfg(unix)]
pub fn write_tool_script(path: impl AsRef<Path>, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create script dir");
    }
    std::fs::write(path, format!("#!/bin/sh\n{body}")).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path.to_path_buf()
}
