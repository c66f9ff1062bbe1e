//! Scan monitor - headless entry point
//!
//! Holds one scan session open for the life of the process and logs every
//! tag read. Usage: `scan-monitor [ws-url]` (falls back to `MEETSCAN_SCAN_URL`).

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use meetscan_client::config::validate_scan_url;
    use meetscan_client::{logging, ApiClient, ClientConfig, ScanSession, ScanSocket};

    logging::init();

    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(url) = std::env::args().nth(1) {
        validate_scan_url(&url).context("invalid scan URL argument")?;
        config.scan_url = url;
    }

    // The processing backend is optional for scanning; just report on it.
    let api = ApiClient::from_config(&config);
    match api.health().await {
        Ok(health) => tracing::info!(
            status = %health.status,
            speech_to_text = health.models.speech_to_text,
            text_summarizer = health.models.text_summarizer,
            "processing API reachable"
        ),
        Err(e) => tracing::warn!("processing API unavailable: {}", e.user_message()),
    }

    let session = ScanSession::open(ScanSocket::new(config.scan_url.clone(), config.reconnect));
    let state = session.state();
    let mut scans = state.watch_last_scan();
    let mut connected = state.watch_connected();

    tracing::info!(url = %config.scan_url, "waiting for scans");

    loop {
        tokio::select! {
            changed = scans.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(scan) = scans.borrow_and_update().clone() {
                    tracing::info!(
                        nfc_id = %scan.nfc_id,
                        reader_id = scan.reader_id.as_deref().unwrap_or("-"),
                        timestamp = scan.timestamp,
                        "scan"
                    );
                }
            }
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                let is_open = *connected.borrow_and_update();
                tracing::info!(connected = is_open, "gateway link");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    session.close();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web build is a library consumed through `scan::use_nfc_socket`.
}
