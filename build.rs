// build.rs

use std::{env, process::Command};

fn main() -> anyhow::Result<()> {
    let git_commit = env::var("GIT_COMMIT").unwrap_or_else(|_| {
        Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
            .unwrap_or_else(|| "unknown".into())
    });

    println!("cargo:rustc-env=GIT_COMMIT={git_commit}");
    println!("cargo:rerun-if-env-changed=GIT_COMMIT");
    println!("cargo:rerun-if-changed=.git/HEAD");

    Ok(())
}

// EOF
