use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = carbon_now::cli::Args::parse();
    carbon_now::init(args.verbose);

    carbon_now::run(args)
}
