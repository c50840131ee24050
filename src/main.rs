use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use flotilla::config::{ComputeConfig, SchedulerConfig};
use flotilla::models::{ExecutionState, Job, NodeInfo, Resources};
use flotilla::node::{ComputeNode, LocalTransport, OrchestratorNode};
use flotilla::scheduler::{Scheduler, StaticNodeSelector};
use flotilla::store::{ExecutionStore, InMemoryExecutionStore};

#[derive(Parser, Debug)]
#[command(name = "flotilla")]
#[command(about = "A distributed compute orchestrator with bid-based placement")]
struct Args {
    /// Number of in-process compute nodes to start
    #[arg(long, default_value = "3")]
    nodes: usize,

    /// Desired execution count for the demo job
    #[arg(long, default_value = "2")]
    count: usize,

    /// Type of the demo job
    #[arg(long, default_value = "batch")]
    job_type: String,

    /// Scheduling pass interval in milliseconds
    #[arg(long, default_value = "100")]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let token = CancellationToken::new();

    // Ctrl-C cancels everything.
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received interrupt, shutting down");
                token.cancel();
            }
        });
    }

    let store = Arc::new(InMemoryExecutionStore::new());
    let transport = Arc::new(LocalTransport::new());
    let selector = Arc::new(StaticNodeSelector::default());

    for i in 1..=args.nodes {
        let node_id = format!("compute-{}", i);
        selector.add_node(NodeInfo::new(&node_id)).await;

        let config = ComputeConfig::new(&node_id)
            .with_accepted_job_types(vec![args.job_type.clone(), "batch".to_string()]);
        let messages = transport.register(&node_id).await;
        let node = ComputeNode::new(config, store.clone());
        let node_token = token.clone();
        tokio::spawn(async move {
            node.run(messages, node_token).await;
        });
    }

    let scheduler = Scheduler::new(store.clone(), transport.clone(), selector.clone());
    let orchestrator = Arc::new(OrchestratorNode::new(
        scheduler,
        SchedulerConfig {
            interval_ms: args.interval_ms,
        },
    ));

    let job = Job::new("demo", &args.job_type, args.count).with_requirements(Resources {
        cpu: 1.0,
        memory_bytes: 512 * 1024 * 1024,
        ..Resources::default()
    });
    let job_id = job.id.clone();
    orchestrator.submit_job(job).await;

    {
        let orchestrator = orchestrator.clone();
        let token = token.clone();
        tokio::spawn(async move {
            orchestrator.run(token).await;
        });
    }

    // Wait for the job to reach its replica target, then report.
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(args.interval_ms));
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let executions = store.get_executions(&job_id).await?;
                let completed = executions
                    .iter()
                    .filter(|e| e.state == ExecutionState::Completed)
                    .count();
                if completed >= args.count {
                    tracing::info!(job_id = %job_id, completed, "Job complete");
                    println!("{}", serde_json::to_string_pretty(&executions)?);
                    token.cancel();
                    break;
                }
            }
        }
    }

    Ok(())
}
