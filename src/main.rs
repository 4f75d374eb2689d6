//! untiscal main entrypoint.

use untiscal::run;
use untiscal::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
