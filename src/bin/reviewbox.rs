use anyhow::Result;

fn main() -> Result<()> {
    reviewbox::cli::run()
}
