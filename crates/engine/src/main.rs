//! vdao replay CLI entry point

fn main() -> anyhow::Result<()> {
    vdao_engine::cli::run_cli()
}
