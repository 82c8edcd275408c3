use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mediaplan_ingest::ingest::{self, MappingMode, Overrides, Preview};
use mediaplan_ingest::{build_state, commit_store, config, observability, run};

#[derive(Parser)]
#[command(name = "mediaplan-ingest", about = "Media-plan spreadsheet ingest")]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,
}

/// Corrections applied before header detection.
#[derive(Args, Debug, Default)]
struct OverrideArgs {
	/// 1-based first row of the table
	#[arg(long)]
	start_row: Option<usize>,
	/// First table column as letters, e.g. C
	#[arg(long)]
	start_col: Option<String>,
	/// 1-based header row within the cropped region
	#[arg(long)]
	header_row: Option<usize>,
	/// Sheet to read instead of the first
	#[arg(long)]
	sheet: Option<String>,
	/// JSON file holding a guided mapping spec
	#[arg(long)]
	mapping: Option<std::path::PathBuf>,
}

impl OverrideArgs {
	fn overrides(&self) -> Overrides {
		Overrides {
			start_row: self.start_row,
			start_col: self.start_col.clone(),
			manual_header_row: self.header_row,
			selected_sheet: self.sheet.clone(),
		}
	}

	fn mode(&self) -> anyhow::Result<MappingMode> {
		match &self.mapping {
			None => Ok(MappingMode::Automatic),
			Some(path) => {
				let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
				let spec = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
				Ok(MappingMode::Guided(spec))
			}
		}
	}
}

#[derive(Subcommand)]
enum Commands {
	/// Run the HTTP service (default)
	Serve {
		/// Keep commits in memory even when a database is configured
		#[arg(long)]
		memory_store: bool,
	},
	/// Print the preview for a local file as JSON
	Preview {
		file: std::path::PathBuf,
		#[command(flatten)]
		overrides: OverrideArgs,
		/// Raw rows to include
		#[arg(long)]
		rows: Option<usize>,
	},
	/// Map a local file and write it to a campaign
	Commit {
		file: std::path::PathBuf,
		#[arg(long)]
		campaign: String,
		#[command(flatten)]
		overrides: OverrideArgs,
	},
}

fn ingest_file(path: &std::path::Path, args: &OverrideArgs, rows: usize) -> anyhow::Result<Preview> {
	let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
	let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
	let preview = ingest::ingest_bytes(&data, filename, &args.overrides(), &args.mode()?, rows)?;
	Ok(preview)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let settings = config::load()?;
	observability::init_logging(settings.log_level)?;

	match cli.command.unwrap_or(Commands::Serve { memory_store: false }) {
		Commands::Serve { memory_store } => {
			let state = build_state(&settings, memory_store).await?;
			run(settings, state).await?;
		}
		Commands::Preview { file, overrides, rows } => {
			let preview = ingest_file(&file, &overrides, rows.unwrap_or(settings.preview_rows))?;
			println!("{}", serde_json::to_string_pretty(&preview)?);
		}
		Commands::Commit {
			file,
			campaign,
			overrides,
		} => {
			let preview = ingest_file(&file, &overrides, settings.preview_rows)?;
			for issue in &preview.batch.issues {
				eprintln!("{}", issue);
			}
			let store = commit_store(&settings).await?;
			let inserted = preview.batch.commit(&campaign, store.as_ref()).await?;
			println!("Inserted {} line items into campaign {}.", inserted, campaign);
		}
	}

	Ok(())
}
