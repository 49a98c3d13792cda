fn main() -> anyhow::Result<()> {
    astrocast_lib::run()
}
