// tests/cli_host_env.rs
//
// Own test binary: it changes the process environment, which must not race
// with other tests reading it.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use clap::Parser;

use shelltask::cli::CliArgs;
use shelltask::run;

#[tokio::test]
async fn env_overrides_skip_host_variables_that_are_not_unicode() {
    init_tracing();

    // SAFETY: this binary holds a single test, so no other thread touches
    // the environment while it is modified.
    unsafe {
        std::env::set_var("SHELLTASK_NOT_UNICODE", OsStr::from_bytes(b"\xff\xfe"));
        std::env::set_var("SHELLTASK_PLAIN", "kept");
    }

    let args = CliArgs::try_parse_from([
        "shelltask",
        "--env",
        "EXTRA=1",
        "--",
        "/bin/sh",
        "-c",
        "test \"$EXTRA\" = 1 && test \"$SHELLTASK_PLAIN\" = kept && test -z \"${SHELLTASK_NOT_UNICODE+x}\"",
    ])
    .unwrap();

    assert_eq!(with_timeout(run(args)).await.unwrap(), 0);
}
