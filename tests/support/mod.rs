//! Shared helpers for the HTTP tests: a fake `java` that behaves like the
//! validator CLI, and an SSE body parser.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fhir_validator_api::Config;
use tempfile::TempDir;

/// Stand-in for `java -jar validator_cli.jar <payload> [args...]`.
///
/// `--fail` exits non-zero, `--hang` never finishes on its own, `--raw` ends
/// with CRLF, a bare CR, a non-UTF-8 byte and no final newline. Any other
/// argument is echoed back.
const FAKE_VALIDATOR: &str = r#"#!/bin/sh
if [ "$1" != "-jar" ]; then
  echo "expected -jar, got $1" >&2
  exit 64
fi
jar="$2"
payload="$3"
shift 3
echo "jar: $jar"
printf '\033[1;32mpayload:\033[0m %s\n' "$(cat "$payload")"
for arg in "$@"; do
  case "$arg" in
    --fail)
      echo "validation failed" >&2
      exit 3
      ;;
    --hang)
      echo "hanging"
      exec sleep 30
      ;;
    --raw)
      printf 'a\r\n\033[31mb\033[0m\rc\ncaf\351\nno-newline'
      exit 0
      ;;
    *)
      echo "arg: $arg"
      ;;
  esac
done
echo "finished" >&2
"#;

static FAKE_VALIDATOR_DIR: OnceLock<TempDir> = OnceLock::new();

/// Path of the fake validator. Written once, before any test spawns it.
pub fn fake_validator() -> PathBuf {
    let dir = FAKE_VALIDATOR_DIR.get_or_init(|| {
        let dir = tempfile::Builder::new()
            .prefix("fake-validator-")
            .tempdir_in(env!("CARGO_TARGET_TMPDIR"))
            .expect("create fake validator dir");
        let script = dir.path().join("java");
        std::fs::write(&script, FAKE_VALIDATOR).expect("write fake validator");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("make fake validator executable");
        dir
    });
    dir.path().join("java")
}

pub fn config_for(work_dir: &Path) -> Config {
    Config {
        work_dir: work_dir.to_path_buf(),
        java_path: fake_validator().display().to_string(),
        validator_jar: "validator_cli.jar".to_string(),
        ..Config::default()
    }
}

/// Config whose validator cannot be started; used to prove a request never
/// reached the spawn step.
pub fn unlaunchable_config(work_dir: &Path) -> Config {
    // Keep the fake written so this test never races another test's spawn.
    fake_validator();
    Config {
        work_dir: work_dir.to_path_buf(),
        java_path: "/nonexistent/bin/java".to_string(),
        ..Config::default()
    }
}

pub fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).expect("read work dir").count()
}

/// Split an SSE body into `(event, data)` pairs.
pub fn parse_sse(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut event = String::new();
            let mut data = Vec::new();
            for line in block.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = value.trim_start().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
            }
            (event, data.join("\n"))
        })
        .collect()
}
