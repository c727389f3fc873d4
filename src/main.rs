use clap::{Arg, Command};
use std::path::Path;
use std::process;

use lfs_serve::config::Config;
use lfs_serve::logging::{self, error};
use lfs_serve::serve;

/// Exit status after a panic anywhere in the process
const PANIC_EXIT_CODE: i32 = 99;

///////////////////////
// Utility functions //
///////////////////////

/// Report a startup or session failure on stderr (shown to the client) and in the log
fn fail(message: &str, code: i32) -> i32 {
	eprintln!("{}", message);
	error!("{}", message);
	code
}

fn install_panic_hook() {
	std::panic::set_hook(Box::new(|info| {
		eprintln!("Panic: {}", info);
		error!("Panic: {}", info);
		process::exit(PANIC_EXIT_CODE);
	}));
}

#[tokio::main]
async fn run() -> i32 {
	let matches = Command::new("git-lfs-serve")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Serve git-lfs objects over the stdin/stdout of an SSH session")
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (TOML)"),
		)
		.arg(Arg::new("path").help("Repository path, relative to the storage root"))
		.get_matches();

	let config = match Config::load(matches.get_one::<String>("config").map(Path::new)) {
		Ok(c) => c,
		Err(e) => return fail(&e.to_string(), e.exit_code()),
	};
	if let Err(e) = logging::init_tracing(&config) {
		eprintln!("git-lfs-serve was unable to initialise logging: {} (continuing anyway)", e);
	}

	let repo_arg = matches.get_one::<String>("path").map(|s| s.as_str());
	let session = match serve::prepare_session(&config, repo_arg).await {
		Ok(s) => s,
		Err(e) => return fail(&e.to_string(), e.exit_code()),
	};

	// Session errors are already in the log
	match serve::serve_stdio(session).await {
		Ok(()) => 0,
		Err(e) => {
			eprintln!("{}", e);
			e.exit_code()
		}
	}
}

fn main() {
	install_panic_hook();
	process::exit(run());
}

// vim: ts=4
