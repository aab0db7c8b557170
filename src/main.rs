fn main() -> anyhow::Result<()> {
    lustre::run()
}
