use super::jobs::Job;
use super::jobs::JobRegistry;
use super::jobs::JobStatus;
use super::request::JobRequest;
use super::response::JobCreated;
use super::response::JobResults;
use super::response::JobStatusResponse;
use crate::error::EngineError;
use crate::evaluation::evaluator::Algorithm;
use crate::evaluation::machine::HAND_RANKS_FILE;
use crate::simulation::engine::Engine;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use std::path::PathBuf;

/// Service configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub hand_ranks: PathBuf,
    pub collector: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("TELEMETRY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("TELEMETRY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            hand_ranks: std::env::var("POKER_HANDRANKS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(HAND_RANKS_FILE)),
            collector: std::env::var("TELEMETRY_COLLECTOR_BINARY")
                .ok()
                .map(PathBuf::from),
        }
    }
}

pub struct Server;

impl Server {
    pub async fn run() -> Result<(), std::io::Error> {
        let config = Config::from_env();
        let bind = (config.host.clone(), config.port);
        let config = web::Data::new(config);
        let registry = web::Data::new(JobRegistry::new());
        log::info!("starting HTTP server on {}:{}", bind.0, bind.1);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(registry.clone())
                .app_data(config.clone())
                .route("/jobs", web::post().to(submit_job))
                .route("/jobs/{id}", web::get().to(job_status))
                .route("/jobs/{id}/results", web::get().to(job_results))
        })
        .bind(bind)?
        .run()
        .await
    }
}

// Route handlers

async fn submit_job(
    registry: web::Data<JobRegistry>,
    config: web::Data<Config>,
    request: web::Json<JobRequest>,
) -> impl Responder {
    let request = request.into_inner();
    if let Err(e) = request.validate() {
        return HttpResponse::BadRequest().body(e.to_string());
    }
    if let Err(e) = Algorithm::try_from(request.algorithm()) {
        return HttpResponse::BadRequest().body(e.to_string());
    }

    let job_id = format!("{:016x}", rand::random::<u64>());
    let job = registry.create(&job_id);
    log::info!(
        "created job {} algorithm={} hands={}",
        job_id,
        request.algorithm(),
        request.range_spec.len()
    );

    let config = config.into_inner();
    let spawned = std::thread::Builder::new()
        .name(format!("job-{}", job_id))
        .spawn({
            let job_id = job_id.clone();
            let job = job.clone();
            move || execute_job(&job_id, &request, &job, &config)
        });
    if let Err(e) = spawned {
        job.fail(&format!("cannot spawn job thread: {}", e));
        return HttpResponse::InternalServerError().body(e.to_string());
    }

    HttpResponse::Ok().json(JobCreated { job_id })
}

async fn job_status(registry: web::Data<JobRegistry>, path: web::Path<String>) -> impl Responder {
    match registry.get(&path) {
        None => HttpResponse::NotFound().body(EngineError::NotFound(path.to_string()).to_string()),
        Some(job) => HttpResponse::Ok().json(JobStatusResponse::from(&job.snapshot())),
    }
}

async fn job_results(registry: web::Data<JobRegistry>, path: web::Path<String>) -> impl Responder {
    match registry.get(&path) {
        None => HttpResponse::NotFound().body(EngineError::NotFound(path.to_string()).to_string()),
        Some(job) => {
            let state = job.snapshot();
            match state.status {
                JobStatus::Completed => HttpResponse::Ok().json(JobResults {
                    job_id: state.id,
                    results: state.final_results,
                }),
                _ => HttpResponse::Conflict().body("job has not completed"),
            }
        }
    }
}

/// Background body of one job: run the engine to completion and push
/// every outcome into the registry. The sibling collector process is
/// spawned alongside when one is configured; it watches the telemetry
/// status byte and exits by itself once the job turns terminal.
fn execute_job(job_id: &str, request: &JobRequest, job: &Job, config: &Config) {
    job.start();
    let engine = Engine::new(request, &config.hand_ranks, Some(job_id));
    let mut engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("job {} failed to start: {}", job_id, e);
            job.fail(&e.to_string());
            return;
        }
    };

    let mut collector = config.collector.as_ref().and_then(|binary| {
        match std::process::Command::new(binary).arg(job_id).spawn() {
            Ok(child) => Some(child),
            Err(e) => {
                log::warn!("collector failed to spawn: {}", e);
                None
            }
        }
    });

    let handle = job.clone();
    engine.set_progress_callback(Box::new(move |progress, live| {
        handle.update_progress(progress, live);
    }));

    match engine.calculate_range_equity(request) {
        Ok(results) => {
            log::info!("job {} completed with {} entries", job_id, results.len());
            job.complete(results);
        }
        Err(e) => {
            log::error!("job {} failed: {}", job_id, e);
            job.fail(&e.to_string());
        }
    }

    if let Some(child) = collector.as_mut() {
        reap(child, job_id);
    }
}

/// give the collector a grace period to notice the terminal status,
/// then force-kill so no child outlives its job unreaped
fn reap(child: &mut std::process::Child, job_id: &str) {
    for _ in 0..20 {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => std::thread::sleep(std::time::Duration::from_millis(100)),
            Err(e) => {
                log::warn!("collector wait for job {}: {}", job_id, e);
                return;
            }
        }
    }
    log::warn!("collector for job {} ignored completion, killing", job_id);
    let _ = child.kill();
    let _ = child.wait();
}
