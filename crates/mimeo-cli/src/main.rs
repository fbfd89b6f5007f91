//! Demonstration driver: build an object graph, deep-copy it, mutate the
//! original, and show that the copy is unaffected.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mimeo_core::{SeqData, TypeRegistry, TypeSpec, Value};
use mimeo_engine::Engine;

#[derive(Parser)]
#[command(name = "mimeo", about = "Deep-copy engine demo", version)]
struct Cli {
    /// Enable debug logging (cloner resolution, cache population)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = Arc::new(TypeRegistry::new());
    let person = registry.register(
        TypeSpec::new("Person")
            .field("name")
            .field("age")
            .field("favorite_books"),
    )?;

    let books = SeqData::from_values(vec![
        Value::from("Maker Beer"),
        Value::from("Fight Club"),
    ]);
    let original = Value::Object(registry.new_object(
        person,
        vec![Value::from("Bob"), Value::Int(21), Value::Seq(books)],
    )?);

    let engine = Engine::new(registry);
    let copy = engine.deep_clone(&original)?;

    println!(
        "Original equals copy is '{}', after check will change orig",
        original == copy
    );

    // Mutate every field of the original, including replacing the list
    let orig = original.as_object().context("original is a Person")?;
    orig.set_field("name", Value::from("Viktor"))?;
    orig.set_field("age", Value::Int(35))?;
    orig.set_field(
        "favorite_books",
        Value::Seq(SeqData::from_values(vec![
            Value::from("Woe from Wit"),
            Value::from("One Hundred Years of Solitude"),
        ])),
    )?;

    println!("orig: {original}");
    println!("copy: {copy}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
