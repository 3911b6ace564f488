use lambda_runtime::{service_fn, Error, LambdaEvent};
use playground_stream_lambda::adapters::logging_sink::LoggingChangeSink;
use playground_stream_lambda::handlers::insert::handle_insert_event;
use playground_stream_lambda::handlers::stream::StreamBatchResponse;
use playground_stream_lambda::telemetry::init_tracing;
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<StreamBatchResponse, Error> {
    let sink = LoggingChangeSink::new(event.context.request_id);
    Ok(handle_insert_event(event.payload, &sink)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
