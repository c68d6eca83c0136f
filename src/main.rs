fn main() -> Result<(), Box<dyn std::error::Error>> {
    duet::runtime::run()
}
