fn main() {
    if let Err(err) = doorwatch_lib::run() {
        eprintln!("doorwatch: {err:#}");
        std::process::exit(1);
    }
}
