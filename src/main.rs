fn main() -> anyhow::Result<()> {
    blogrouter::cli::run_cli()
}
