use std::env;
use std::net::SocketAddr;
use std::process;
use std::time::Duration;

use getopts::{Matches, Options};

const BACKEND_ENV: &str = "WP_FEED_BACKEND";
const MAX_PER_PAGE: u32 = 100;

pub struct Args {
    pub address: SocketAddr,
    pub backend: String,
    pub site: String,
    pub per_page: u32,
    pub events_per_page: u32,
    pub timeout: Duration,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "b",
        "backend",
        "Base URL of the WordPress site [Default: $WP_FEED_BACKEND]",
        "URL",
    );
    opts.optopt(
        "s",
        "site",
        "Public URL of the site, used in exported calendars [Default: the backend URL]",
        "URL",
    );
    opts.optopt(
        "p",
        "per-page",
        "Articles per page of the news feed [Default: 12]",
        "COUNT",
    );
    opts.optopt(
        "e",
        "events-per-page",
        "Events fetched for the list and calendar views [Default: 50]",
        "COUNT",
    );
    opts.optopt(
        "t",
        "timeout",
        "Timeout for requests to the backend [Default: 10]",
        "SECONDS",
    );
    opts
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn page_size(matches: &Matches, name: &str, default: u32) -> u32 {
    match matches.opt_get_default(name, default) {
        Ok(count) if (1..=MAX_PER_PAGE).contains(&count) => count,
        Ok(count) => fail(&format!(
            "Provided value for option '{name}' must be between 1 and {MAX_PER_PAGE}, got {count}"
        )),
        Err(err) => fail(&format!("Provided value for option '{name}' is invalid: {err}")),
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// The public site defaults to the backend, which is the same host on a
// plain WordPress install.
fn site(matches: &Matches, backend: &str) -> Option<String> {
    match matches.opt_str("site") {
        Some(site) => is_http(&site).then_some(site),
        None => Some(backend.to_string()),
    }
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(err) => fail(&err.to_string()),
    };

    if matches.opt_present("help") {
        println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
        process::exit(0);
    }

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 8080)))
    {
        Ok(address) => address,
        Err(err) => fail(&format!("Provided value for option 'address' is invalid: {err}")),
    };

    let Some(backend) = matches
        .opt_str("backend")
        .or_else(|| env::var(BACKEND_ENV).ok())
        .filter(|backend| is_http(backend))
    else {
        fail(&format!(
            "Option 'backend' (or `{BACKEND_ENV}`) must be set to an http(s) URL"
        ));
    };

    let Some(site) = site(&matches, &backend) else {
        fail("Option 'site' must be an http(s) URL");
    };

    let per_page = page_size(&matches, "per-page", 12);
    let events_per_page = page_size(&matches, "events-per-page", 50);

    let timeout = match matches.opt_get_default("timeout", 10) {
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => fail(&format!("Provided value for option 'timeout' is invalid: {err}")),
    };

    Args {
        address,
        backend,
        site,
        per_page,
        events_per_page,
        timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Matches {
        opts().parse(args).unwrap()
    }

    #[test]
    fn site_defaults_to_the_backend() {
        let matches = parse_args(&["-b", "https://cms.example.org"]);
        assert_eq!(
            site(&matches, "https://cms.example.org").as_deref(),
            Some("https://cms.example.org")
        );
    }

    #[test]
    fn site_can_differ_from_the_backend() {
        let matches = parse_args(&["-b", "https://cms.example.org", "--site", "https://www.example.org"]);
        assert_eq!(
            site(&matches, "https://cms.example.org").as_deref(),
            Some("https://www.example.org")
        );

        let matches = parse_args(&["-s", "www.example.org"]);
        assert_eq!(site(&matches, "https://cms.example.org"), None);
    }
}
