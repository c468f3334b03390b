use std::{io::Read, path::Path};

use hyper::{header, Body, Client, Request, StatusCode};
use hyper_tls::HttpsConnector;
use tracing::info;

use crate::{
    config::Source,
    error::{Error, Result},
};

const ACCEPT: &str = "application/vnd.github+json, application/json;q=0.9";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Produce the raw JSON text for a source. No retries.
pub async fn resolve(source: &Source) -> Result<String> {
    let text = match source {
        Source::File(path) => read_file(path)?,
        Source::Url(url) => fetch(url).await?,
    };

    info!("Read {} bytes of JSON", text.len());
    Ok(text)
}

fn read_file(path: &Path) -> Result<String> {
    let io_error = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(io_error)?;
        return Ok(text);
    }

    std::fs::read_to_string(path).map_err(io_error)
}

async fn fetch(url: &str) -> Result<String> {
    let fetch_error = |reason: String| Error::Fetch {
        url: url.to_string(),
        reason,
    };

    info!("Fetching {url}");

    let request = Request::get(url)
        .header(header::ACCEPT, ACCEPT)
        .header(header::USER_AGENT, USER_AGENT)
        .body(Body::empty())
        .map_err(|e| fetch_error(e.to_string()))?;

    let client = Client::builder().build::<_, Body>(HttpsConnector::new());
    let resp = client
        .request(request)
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    check_status(url, resp.status())?;

    let bytes = hyper::body::to_bytes(resp.into_body())
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    String::from_utf8(bytes.to_vec()).map_err(|e| fetch_error(format!("body is not UTF-8: {e}")))
}

fn check_status(url: &str, status: StatusCode) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    Err(Error::Fetch {
        url: url.to_string(),
        reason: format!("status code is {status}"),
    })
}
