fn main() -> miette::Result<()> {
    sqlplot::cli::run()
}
