#![forbid(unsafe_code)]

fn main() {
    revop_demo::init_logging();
    match revop_demo::run_from_env() {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(error.exit_code());
        }
    }
}
