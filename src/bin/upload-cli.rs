use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "upload-cli")]
#[command(about = "Drive the upload tracer's producer and consumer routes", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the payload and record trace ids in object metadata
    Upload {
        /// Continue this caller trace instead of starting a new one
        #[arg(long)]
        traceparent: Option<String>,
    },
    /// Upload the payload and publish a custom event carrying trace ids
    UploadCustom {
        #[arg(long)]
        traceparent: Option<String>,
    },
    /// Send a webhook handshake to the CloudEvents route
    Handshake,
    /// Deliver a structured CloudEvent for an uploaded object
    SendCloudEvent {
        #[arg(long)]
        object_url: String,
        #[arg(long)]
        traceparent: Option<String>,
    },
    /// Deliver a native blob-created notification for an uploaded object
    SendStorageEvent {
        #[arg(long)]
        object_url: String,
        #[arg(long, default_value = "Microsoft.Storage.BlobCreated")]
        event_type: String,
    },
    /// Check service liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Upload { traceparent } => {
            with_traceparent(client.post(format!("{}/api/upload", cli.url)), traceparent)
                .send()
                .await?
        }
        Commands::UploadCustom { traceparent } => {
            with_traceparent(
                client.post(format!("{}/api/upload-custom", cli.url)),
                traceparent,
            )
            .send()
            .await?
        }
        Commands::Handshake => {
            let res = client
                .request(reqwest::Method::OPTIONS, format!("{}/api/events/cloud", cli.url))
                .header("WebHook-Request-Origin", "eventgrid.azure.net")
                .send()
                .await?;
            let origin = res
                .headers()
                .get("webhook-allowed-origin")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<none>");
            println!("status: {}, allowed origin: {}", res.status(), origin);
            return Ok(());
        }
        Commands::SendCloudEvent {
            object_url,
            traceparent,
        } => {
            let mut event = json!({
                "specversion": "1.0",
                "id": uuid::Uuid::new_v4().to_string(),
                "source": "/upload-cli",
                "type": "Microsoft.Storage.BlobCreated",
                "time": chrono::Utc::now().to_rfc3339(),
                "datacontenttype": "application/json",
                "data": { "api": "PutBlob", "url": object_url },
            });
            if let Some(traceparent) = traceparent {
                event["traceparent"] = Value::String(traceparent);
            }
            client
                .post(format!("{}/api/events/cloud", cli.url))
                .header("content-type", "application/cloudevents+json")
                .body(event.to_string())
                .send()
                .await?
        }
        Commands::SendStorageEvent {
            object_url,
            event_type,
        } => {
            let batch = json!([{
                "id": uuid::Uuid::new_v4().to_string(),
                "subject": "/blobServices/default/containers/uploads",
                "eventType": event_type,
                "eventTime": chrono::Utc::now().to_rfc3339(),
                "dataVersion": "",
                "data": { "api": "PutBlob", "blobType": "BlockBlob", "url": object_url },
            }]);
            client
                .post(format!("{}/api/events/storage", cli.url))
                .json(&batch)
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
    };

    print_response(res).await
}

fn with_traceparent(
    request: reqwest::RequestBuilder,
    traceparent: Option<String>,
) -> reqwest::RequestBuilder {
    match traceparent {
        Some(value) => request.header("traceparent", value),
        None => request,
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
