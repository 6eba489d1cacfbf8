//! changelogd binary entry point.

use changelogd::ui::output;

fn main() {
    if let Err(err) = changelogd::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
