#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "tydoc", about = "Debug type-stream inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Info {
		path: PathBuf,
	},
	List {
		path: PathBuf,
		#[arg(long)]
		kind: Option<String>,
		#[arg(long)]
		filter: Option<String>,
		#[arg(long)]
		json: bool,
	},
	Dump(cmd::dump::Args),
	Show(cmd::show::Args),
	Diff(cmd::diff::Args),
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> tydoc::tys::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info { path } => cmd::info::run(path),
		Commands::List { path, kind, filter, json } => cmd::list::run(path, kind, filter, json),
		Commands::Dump(args) => cmd::dump::run(args),
		Commands::Show(args) => cmd::show::run(args),
		Commands::Diff(args) => cmd::diff::run(args),
	}
}
