use anyhow::Result;

fn main() -> Result<()> {
    external_extruder::cli::run()
}
