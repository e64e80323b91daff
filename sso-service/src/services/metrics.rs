use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static LOGINS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static REGISTRATIONS_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static PERMISSION_CACHE_HITS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PERMISSION_CACHE_MISSES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static GATE_REJECTIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec, prometheus::Error> {
    IntCounterVec::new(Opts::new(name, help), labels)
}

/// Create and register all counters. Safe to call more than once; only the
/// first call installs the globals.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    if let Err(e) = try_init_metrics() {
        tracing::error!("Failed to initialize metrics: {}", e);
        panic!("Failed to initialize metrics: {}", e);
    }
}

fn try_init_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let logins = counter_vec("sso_logins_total", "Login attempts by outcome", &["outcome"])?;
    let registrations = IntCounter::new("sso_registrations_total", "Successful registrations")?;
    let hits = counter_vec(
        "permission_cache_hits_total",
        "Permission checks answered from cache",
        &["kind"],
    )?;
    let misses = counter_vec(
        "permission_cache_misses_total",
        "Permission checks that fell through to storage",
        &["kind"],
    )?;
    let rejections = counter_vec(
        "sso_gate_rejections_total",
        "Calls rejected by the request gate",
        &["reason"],
    )?;

    registry.register(Box::new(logins.clone()))?;
    registry.register(Box::new(registrations.clone()))?;
    registry.register(Box::new(hits.clone()))?;
    registry.register(Box::new(misses.clone()))?;
    registry.register(Box::new(rejections.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = LOGINS_TOTAL.set(logins);
    let _ = REGISTRATIONS_TOTAL.set(registrations);
    let _ = PERMISSION_CACHE_HITS_TOTAL.set(hits);
    let _ = PERMISSION_CACHE_MISSES_TOTAL.set(misses);
    let _ = GATE_REJECTIONS_TOTAL.set(rejections);
    Ok(())
}

pub fn record_login(success: bool) {
    if let Some(counter) = LOGINS_TOTAL.get() {
        let outcome = if success { "success" } else { "failure" };
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_registration() {
    if let Some(counter) = REGISTRATIONS_TOTAL.get() {
        counter.inc();
    }
}

pub fn record_permission_cache(kind: &str, hit: bool) {
    let counter = if hit {
        PERMISSION_CACHE_HITS_TOTAL.get()
    } else {
        PERMISSION_CACHE_MISSES_TOTAL.get()
    };
    if let Some(counter) = counter {
        counter.with_label_values(&[kind]).inc();
    }
}

pub fn record_gate_rejection(reason: &str) {
    if let Some(counter) = GATE_REJECTIONS_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}
