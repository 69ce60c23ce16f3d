//! `block-roulette` binary: lift one randomly chosen block from the signed-in account.

// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use block_roulette::{
	app::{self, RunOptions},
	cli::{self, Cli},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::load();

	cli::init_tracing(cli.log_format).map_err(|e| eyre!(e))?;

	let client = cli.build_client()?;
	let mut rng = cli.rng();
	let outcome = app::run(&client, RunOptions { dry_run: cli.dry_run }, &mut rng).await?;

	if outcome.unblocked {
		println!(
			"Unblocked {} ({} blocked accounts remained).",
			outcome.chosen,
			outcome.blocked_count - 1
		);
	} else {
		println!(
			"Would unblock {} (dry run, {} blocked accounts).",
			outcome.chosen, outcome.blocked_count
		);
	}

	Ok(())
}
