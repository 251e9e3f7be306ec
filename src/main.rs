fn main() {
    if let Err(e) = vitrine::app::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
