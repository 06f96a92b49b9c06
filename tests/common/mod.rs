//! Common test utilities for the HTTP tests

use excel_normalizer::router;
use normalizer_lib::Ingestor;
use reqwest::multipart::{Form, Part};
use tokio::net::TcpListener;

// Re-export the fixture builders shared with the library tests
#[allow(unused_imports)]
pub use normalizer_lib::test_utils::{create_test_ingestor, xlsx_fixture};

/// Serve `ingestor` on an ephemeral local port and return its base URL
pub async fn spawn_server(ingestor: Ingestor) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(ingestor)).await.unwrap();
    });

    format!("http://{address}")
}

/// Multipart form with `bytes` in the `file` field
#[allow(dead_code)]
pub fn upload_form(filename: &str, bytes: Vec<u8>) -> Form {
    Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()))
}
