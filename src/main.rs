fn main() {
    if let Err(err) = csv_dedup_lib::run() {
        eprintln!("csv-dedup failed: {err}");
        std::process::exit(1);
    }
}
