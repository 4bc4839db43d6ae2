//! Languages command

use anyhow::Result;
use semindex_core::Language;

pub async fn run() -> Result<()> {
    for language in Language::ALL {
        println!(
            "{:<12} .{}",
            language.as_str(),
            language.extensions().join(", .")
        );
    }
    println!("{:<12} .md, .markdown", "markdown");
    println!("{:<12} .json (OpenAPI/Swagger)", "api-spec");
    Ok(())
}
