use std::process::exit;

use mtv_dat::cli::parse_args;
use mtv_dat::cli::run;

fn main() {
    let args = parse_args();
    if let Err(e) = run(&args) {
        eprintln!("{e:#}");
        exit(1);
    }
}
