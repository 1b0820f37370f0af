//! Startup banner.

use super::constants::APP_NAME;

pub fn print_banner(host: &str, port: u16, api_key_count: usize, dev_placeholder: bool) {
    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<18}\x1b[0m http://{host}:{port}",
        "Control API:"
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<18}\x1b[0m ws://{host}:{port}/ws",
        "WebSocket:"
    );
    if dev_placeholder {
        println!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<18}\x1b[0m development placeholder key only — set BROKER_API_KEYS",
            "Auth:"
        );
    } else {
        println!(
            "  \x1b[32m➜\x1b[0m  \x1b[1m{:<18}\x1b[0m {api_key_count} key(s) configured",
            "Auth:"
        );
    }
    println!();
}
