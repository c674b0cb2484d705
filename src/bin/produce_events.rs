//! Development event producer
//!
//! Publishes random bet/win events to the transactions topic.
//!
//! Run with: cargo run --bin produce_events -- --events 100 --interval-ms 200 --duplicate-every 10

use std::time::{Duration, Instant};

use rand::Rng;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};

use casino_transactions::consumer::TransactionMessage;

fn arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn generate_event(rng: &mut impl Rng, users: u32) -> TransactionMessage {
    let transaction_type = if rng.gen_bool(0.5) { "bet" } else { "win" };

    TransactionMessage {
        id: Some(uuid::Uuid::new_v4().to_string()),
        user_id: format!("user-{}", rng.gen_range(1..=users)),
        transaction_type: transaction_type.to_string(),
        amount: rng.gen_range(1..=1000),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let event_count: u64 = arg(&args, "--events", 100);
    let interval = Duration::from_millis(arg(&args, "--interval-ms", 200));
    // Every Nth event re-sends the previous id; 0 disables
    let duplicate_every: u64 = arg(&args, "--duplicate-every", 0);
    let users: u32 = arg(&args, "--users", 5).max(1);

    let brokers = std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
    let topic = std::env::var("KAFKA_TOPIC").unwrap_or_else(|_| "casino-transactions".to_string());

    println!("Producing {} events to {} via {}", event_count, topic, brokers);

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("message.timeout.ms", "5000")
        .create()?;

    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut delivered = 0u64;
    let mut duplicates = 0u64;
    let mut previous: Option<TransactionMessage> = None;

    for i in 1..=event_count {
        let event = match previous.take() {
            Some(prev) if duplicate_every > 0 && i % duplicate_every == 0 => {
                duplicates += 1;
                prev
            }
            _ => generate_event(&mut rng, users),
        };

        let payload = serde_json::to_string(&event)?;
        let key = event.id.clone().unwrap_or_default();

        match producer
            .send(
                FutureRecord::to(&topic).payload(&payload).key(&key),
                Duration::from_secs(0),
            )
            .await
        {
            Ok((partition, offset)) => {
                delivered += 1;
                println!("[{}] partition={} offset={} {}", i, partition, offset, payload);
            }
            Err((e, _)) => eprintln!("[{}] delivery failed: {}", i, e),
        }

        previous = Some(event);
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    println!("\n=== Producer Results ===");
    println!("Total events: {}", event_count);
    println!("Delivered: {}", delivered);
    println!("Duplicates sent: {}", duplicates);
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
