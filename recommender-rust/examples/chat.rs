use dotenvy::dotenv;
use moodcast::{Orchestrator, RecommenderConfig, Sender, EXAMPLE_PROMPTS};
use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let config = RecommenderConfig::from_env()?;
    let orchestrator = Orchestrator::from_config(&config);

    // Print entries as they are appended, including mid-turn notices.
    let mut states = orchestrator.subscribe();
    tokio::spawn(async move {
        let mut printed = 0;
        while states.changed().await.is_ok() {
            let entries = states.borrow_and_update().entries.clone();
            for entry in &entries[printed..] {
                let label = match entry.sender {
                    Sender::User => continue,
                    Sender::Assistant => "assistant",
                    Sender::System => "system",
                };
                println!("[{label}] {}\n", entry.text);
            }
            printed = entries.len();
        }
    });

    println!("Share your mood or interests. Try asking:");
    for (index, example) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!("  /example {index}  {example}");
    }
    println!("Other commands: /results, /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/results", _) => {
                for podcast in &orchestrator.state().podcasts {
                    println!(
                        "* {} <{}>",
                        podcast.title,
                        podcast.web_url.as_deref().unwrap_or("no link")
                    );
                }
            }
            ("/example", index) => match index.parse::<usize>() {
                Ok(index) if orchestrator.use_example(index) => {
                    println!("> {}", orchestrator.state().draft);
                    orchestrator.submit_draft().await;
                }
                _ => println!("Pick an example between 0 and {}", EXAMPLE_PROMPTS.len() - 1),
            },
            _ => {
                orchestrator.submit(line).await;
            }
        }
    }

    Ok(())
}
