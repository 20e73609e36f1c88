use lib_essentials::{app, cli::CliArgs, logging::setup_logging};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = app::load_config(&args)?;
    setup_logging(&config.logging, args.json_logs)?;

    for line in app::run(&args, config)? {
        println!("{line}");
    }
    Ok(())
}
