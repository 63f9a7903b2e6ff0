fn main() -> anyhow::Result<()> {
    manoexport::cli::run_cli()
}
