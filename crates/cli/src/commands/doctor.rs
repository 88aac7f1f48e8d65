use leadflow_agent::runtime::{build_content_search, build_llm_client};
use leadflow_core::config::{AppConfig, LoadOptions};
use leadflow_db::{connect_from_config, migrations};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 2] = ["database_connectivity", "collaborators"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 6 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database_connectivity(&config));
            checks.push(check_collaborators(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let applied = migrations::applied_count(&pool)
            .await
            .map_err(|error| format!("failed to read migration history: {error}"));
        pool.close().await;
        applied
    });

    let known = migrations::known_count();
    match result {
        Ok(applied) if applied >= known as i64 => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!(
                "connected using `{}`, {applied}/{known} migrations applied",
                config.database.url
            ),
        },
        Ok(applied) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!(
                "connected using `{}` but only {applied}/{known} migrations applied; run `leadflow migrate`",
                config.database.url
            ),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

/// Both collaborators are optional; only a configured-but-unbuildable one fails.
fn check_collaborators(config: &AppConfig) -> DoctorCheck {
    let llm = if config.llm.enabled {
        build_llm_client(&config.llm)
            .map(|_| format!("llm {}:{}", config.llm.provider, config.llm.model))
    } else {
        Ok("llm disabled (greeting fallback only)".to_string())
    };
    let search = build_content_search(&config.search).map(|_| match &config.search.base_url {
        Some(url) if !url.trim().is_empty() => format!("search at `{}`", url.trim()),
        _ => "search disabled (static answers only)".to_string(),
    });

    match (llm, search) {
        (Ok(llm), Ok(search)) => DoctorCheck {
            name: "collaborators",
            status: CheckStatus::Pass,
            details: format!("{llm}; {search}"),
        },
        (Err(error), _) | (_, Err(error)) => DoctorCheck {
            name: "collaborators",
            status: CheckStatus::Fail,
            details: format!("failed to build collaborator: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
