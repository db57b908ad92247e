fn main() {
    if let Err(e) = cpl_stats_lib::run() {
        eprintln!("cpl-stats: {e}");
        std::process::exit(1);
    }
}
