//! Connection-URL normalization (§6). No URL-parsing crate is pulled in —
//! the reference crate has none in its dependency stack, so normalization
//! and the small `host`/`hostaddr`/`sslmode` reconstruction stay
//! string-split based rather than introducing `url`.

/// Accepts `postgres://` or `postgresql://`, normalizing the latter to the
/// former. Anything else is passed through unchanged (sqlx itself rejects
/// an unrecognized scheme at connect time).
pub fn normalize_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("postgresql://") {
        format!("postgres://{rest}")
    } else {
        url.to_string()
    }
}

/// Reconstructs the query-parameter portion of a connection URL,
/// recognizing only `host`, `hostaddr`, and `sslmode` (§6). `sslmode`
/// defaults to `disable` when absent; `hostaddr` mirrors `host` when
/// present (forces IPv4 resolution).
pub fn normalize_params(url: &str) -> String {
    let url = normalize_scheme(url);
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), query.to_string()),
        None => (url, String::new()),
    };

    let mut host: Option<String> = None;
    let mut hostaddr: Option<String> = None;
    let mut sslmode: Option<String> = None;
    let mut other_params = Vec::new();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        match pair.split_once('=') {
            Some(("host", v)) => host = Some(v.to_string()),
            Some(("hostaddr", v)) => hostaddr = Some(v.to_string()),
            Some(("sslmode", v)) => sslmode = Some(v.to_string()),
            Some((k, v)) => other_params.push(format!("{k}={v}")),
            None => {}
        }
    }

    if hostaddr.is_none() {
        hostaddr = host.clone();
    }
    let sslmode = sslmode.unwrap_or_else(|| "disable".to_string());

    let mut params = Vec::new();
    if let Some(host) = host {
        params.push(format!("host={host}"));
    }
    if let Some(hostaddr) = hostaddr {
        params.push(format!("hostaddr={hostaddr}"));
    }
    params.push(format!("sslmode={sslmode}"));
    params.extend(other_params);

    format!("{base}?{}", params.join("&"))
}
