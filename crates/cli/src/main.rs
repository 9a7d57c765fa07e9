fn main() {
    if let Err(e) = scanline_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
