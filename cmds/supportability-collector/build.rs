use std::process::Command;

fn main() {
	// Re-run if git HEAD changes
	println!("cargo:rerun-if-changed=.git/HEAD");
	println!("cargo:rerun-if-changed=.git/refs/");

	let version = get_git_commit().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
	println!("cargo:rustc-env=COLLECTOR_VERSION={}", version);
}

fn get_git_commit() -> Option<String> {
	let output = Command::new("git")
		.args(["rev-parse", "--short", "HEAD"])
		.output()
		.ok()?;

	if !output.status.success() {
		return None;
	}

	let commit = String::from_utf8(output.stdout).ok()?;
	let commit = commit.trim();
	if commit.is_empty() {
		None
	} else {
		Some(commit.to_string())
	}
}
