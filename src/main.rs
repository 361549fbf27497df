fn main() -> Result<(), Box<dyn std::error::Error>> {
    flowspec_extract::run()
}
