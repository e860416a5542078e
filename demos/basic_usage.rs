//! Basic logger usage example
//!
//! Demonstrates console output, the level scale, derived loggers and macros.
//!
//! Run with: cargo run --example basic_usage

use rust_log_pipeline::prelude::*;
use rust_log_pipeline::{info, warn};

fn main() -> Result<()> {
    println!("=== Rust Log Pipeline - Basic Usage Example ===\n");

    let console = ConsoleAdapter::new().with_options(
        AdapterOptions::new()
            .with_level(Level::TRACE)
            .with_time_format(TimestampFormat::Kitchen)
            .with_add_source(true),
    );
    let logger = Logger::builder()
        .level(Level::TRACE)
        .adapter(console)
        .build();

    println!("1. Logging at every named level:");
    logger.trace("This is a trace message");
    logger.verbose("This is a verbose message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.success("This is a success message");
    logger.notice("This is a notice");
    logger.deprecated("This API is deprecated");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.bug("This should never happen");
    logger.fatal("This is a fatal message");
    logger.log(Level::new(6), "An intermediate level renders as WARN+2");

    println!("\n2. Raising the minimum level:");
    logger.set_level(Level::WARN);
    logger.info("Info message (hidden)");
    logger.warn("Warning message (visible)");
    logger.always("ALWAYS passes any minimum short of QUIET");

    println!("\n3. Attributes, groups and macros:");
    logger.set_level(Level::INFO);
    let http = logger
        .with_attrs(vec![Attr::new("service", "checkout")])
        .with_group("http");
    http.info_attrs(
        "Request handled",
        vec![Attr::new("status", 200), Attr::new("path", "/cart")],
    );
    info!(http, { "user" => "ada" }, "User {} signed in", "ada");
    warn!(logger, "Retry {} of {}", 1, 3);

    logger.dispose()?;
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
