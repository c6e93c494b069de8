//! Resolve and print the headers a payload would be published with.
//!
//! ```text
//! cargo run --example publish --features mock -- \
//!     --spec demos/asyncapi.yaml --topic user.created --payload '{"userId": "U_123"}'
//! ```

use header_injector::{
    publish::{MockPublisher, Producer},
    HeaderInjector,
};
use std::{error::Error as StdError, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Args {
    /// Path to the YAML or JSON channel specification
    #[structopt(long, parse(from_os_str))]
    spec: PathBuf,

    /// The topic to publish to
    #[structopt(long)]
    topic: String,

    /// The JSON object payload to publish
    #[structopt(long)]
    payload: String,
}

async fn run(args: Args) -> Result<(), Box<dyn StdError + 'static>> {
    let injector = HeaderInjector::from_path(&args.spec)?;
    for field in injector.undeclared_references(&args.topic) {
        eprintln!("note: header templates reference undeclared payload field `{field}`");
    }

    let producer = Producer::new(injector, MockPublisher::new());
    println!("available topics: {:?}", producer.available_topics());

    let published = producer.publish_json(&args.topic, &args.payload).await?;
    println!("published message {}", published.id);
    for (name, value) in published.headers.iter() {
        println!("  {name}: {value}");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::from_args();

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds");
    match rt.block_on(run(args)) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("error: {}", e);
            let mut source = e.source();
            while let Some(src) = source {
                eprintln!("  caused by: {}", src);
                source = src.source();
            }
            std::process::exit(1);
        }
    }
}
