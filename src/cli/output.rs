//! Handles all user-facing output for the CLI.
//!
//! Centralizing the pretty-printing and colorizing here keeps the command
//! handlers free of presentation concerns.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::tags::TagDoc;

/// Prints a green success line.
pub fn print_success(msg: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    println!("{msg}");
    let _ = stdout.reset();
}

/// Prints a user-facing error heading; the rich diagnostic follows it.
pub fn print_failure(msg: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    eprintln!("Error: {msg}");
    let _ = stderr.reset();
}

/// Prints the registered tag documentation in a readable layout.
pub fn print_tag_docs(docs: &[TagDoc]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for doc in docs {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        println!("+{}", doc.tag);
        let _ = stdout.reset();
        println!("  {}", doc.description);
        let scopes: Vec<String> = doc.scopes.iter().map(|s| s.to_string()).collect();
        println!("  scopes: {}", scopes.join(", "));
        for payload in &doc.payloads {
            println!("  payload: {}", payload.description);
            if !payload.docs.is_empty() {
                println!("    {}", payload.docs);
            }
            for schema in &payload.schema {
                if schema.default.is_empty() {
                    println!("    {}: {} ({})", schema.key, schema.value, schema.docs);
                } else {
                    println!(
                        "    {}: {} ({}; default: {})",
                        schema.key, schema.value, schema.docs, schema.default
                    );
                }
            }
        }
        println!();
    }
}
