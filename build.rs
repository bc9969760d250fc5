//! Build script that embeds version information.

use std::process::Command;

fn main() {
    // Prefer CONVERGE_VERSION when set by a release pipeline, otherwise fall
    // back to git describe for local builds.
    if let Ok(version) = std::env::var("CONVERGE_VERSION") {
        println!("cargo:rustc-env=CONVERGE_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=CONVERGE_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=CONVERGE_VERSION");
}
