//! services/web/src/bin/openapi.rs
//!
//! This binary generates the OpenAPI 3.0 specification for the gateway's JSON
//! endpoints and saves it to a file named `openapi.json`.

use utoipa::OpenApi;
use web_lib::web::rest::ApiDoc;

/// Generates the OpenAPI specification and writes it to a file.
fn generate_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI specification generated at {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    generate_spec(ApiDoc::openapi(), "openapi.json")?;
    Ok(())
}
