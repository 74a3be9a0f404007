//! Vehicle Risk Pipeline - Main Entry Point
//!
//! Consumes prediction requests from NATS, aligns them to the training-time
//! feature schema, runs the selected classifier, and publishes risk
//! assessments. Supports parallel request processing.

use anyhow::Result;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use vehicle_risk_pipeline::{
    aligner::FeatureAligner,
    bundle::PredictionEngine,
    config::AppConfig,
    consumer::RequestConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    producer::AssessmentProducer,
    types::assessment::RiskAssessment,
    types::request::PredictionRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vehicle_risk_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Vehicle Risk Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    print_banner(&config.assets.banner_path);

    // Load the model bundle; a missing or corrupt bundle is fatal
    let engine = Arc::new(PredictionEngine::new(&config)?);
    info!(
        "Prediction engine initialized with {} classifiers: {:?}",
        engine.model_count(),
        engine.model_names()
    );

    // Check the request expansion against the fitted schema once, up front
    let aligner = Arc::new(FeatureAligner::new());
    for column in aligner.check_schema(engine.schema()) {
        warn!(
            column = %column,
            "Schema column can never be populated by request expansion; it will stay 0"
        );
    }

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(AssessmentProducer::new(
        client.clone(),
        &config.nats.assessment_subject,
    ));

    // Parallel processing configuration
    let num_workers = config.pipeline.workers;
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing assessments to: {}", config.nats.assessment_subject);

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let report_interval = config.pipeline.report_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, report_interval);
        reporter.start().await;
    });

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Process requests in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        // Clone shared resources for the spawned task
        let engine = engine.clone();
        let aligner = aligner.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        // Spawn task to process this request
        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<PredictionRequest>(&message.payload) {
                Ok(request) => {
                    let request_id = request.request_id.clone();

                    // Align the raw record to the fitted column layout
                    let features = aligner.align(&request, engine.schema());

                    let infer_start = Instant::now();
                    let assessment = match engine.predict(request.model_choice, &features) {
                        Ok(prediction) => {
                            metrics.record_model_time(prediction.model.as_str(), infer_start.elapsed());
                            metrics.record_prediction(start_time.elapsed(), prediction.label.as_str());

                            debug!(
                                request_id = %request_id,
                                model = %prediction.model,
                                raw_class = prediction.raw_class,
                                label = %prediction.label.as_str(),
                                processing_time_us = start_time.elapsed().as_micros(),
                                "Request assessed"
                            );

                            RiskAssessment::success(
                                request_id.clone(),
                                prediction.model,
                                prediction.raw_class,
                            )
                        }
                        Err(e) => {
                            // Surfaced to the submitter; no retry
                            error!(
                                request_id = %request_id,
                                error = %e,
                                "Inference failed"
                            );
                            metrics.record_failure();
                            RiskAssessment::failure(
                                request_id.clone(),
                                request.model_choice,
                                e.to_string(),
                            )
                        }
                    };

                    if let Err(e) = producer.publish(&assessment).await {
                        error!(
                            request_id = %request_id,
                            error = %e,
                            "Failed to publish assessment"
                        );
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                    // Log progress every 100 requests
                    if count % 100 == 0 {
                        let throughput = metrics.get_throughput();
                        let processing_stats = metrics.get_processing_stats();
                        info!(
                            processed = count,
                            throughput = format!("{:.1} req/s", throughput),
                            avg_latency_us = processing_stats.mean_us,
                            "Processing milestone"
                        );
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize prediction request");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    // Print final summary
    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}

/// Cosmetic startup banner; absence never affects prediction behavior
fn print_banner(path: &str) {
    match std::fs::read_to_string(path) {
        Ok(banner) => {
            for line in banner.lines() {
                info!("{}", line);
            }
        }
        Err(_) => {
            info!(path = %path, "No banner asset found, continuing without it");
        }
    }
}
