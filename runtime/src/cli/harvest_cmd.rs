//! `handbook harvest`: fetch every subject's requirements and write them out.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;

use crate::cli::output::{self, Styled};
use crate::config::{ConfigOverrides, HarvestConfig};
use crate::harvest::{HarvestReport, Harvester};
use crate::progress::{self, HarvestEventKind, ProgressReceiver};
use crate::sink;

/// Run the harvest command.
pub async fn run(overrides: ConfigOverrides, out: &Path) -> Result<()> {
    let config = HarvestConfig::resolve(overrides).context("invalid harvest configuration")?;

    if !output::is_quiet() {
        eprintln!(
            "  Harvesting {} (pages: {}, workers: {})",
            config.base_url, config.pages, config.max_workers
        );
    }

    let harvester = Harvester::from_config(config).context("failed to prepare harvest")?;

    let (harvester, renderer) = if output::is_quiet() {
        (harvester, None)
    } else {
        let (tx, rx) = progress::channel();
        (
            harvester.with_progress(tx),
            Some(tokio::spawn(render_progress(rx))),
        )
    };

    let result = harvester.run().await;
    // Dropping the harvester closes the progress channel.
    drop(harvester);
    if let Some(renderer) = renderer {
        let _ = renderer.await;
    }
    let report = result.context("harvest aborted")?;

    sink::write_records(out, &report.records)
        .with_context(|| format!("failed to write {}", out.display()))?;

    print_report(&report, out);
    Ok(())
}

fn print_report(report: &HarvestReport, out: &Path) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "subjects": report.complete_count(),
            "records_written": report.records.len(),
            "failed_subjects": report.failed_subjects,
            "failed_pages": report.failed_pages,
            "page_count": report.page_count,
            "elapsed_ms": report.elapsed_ms,
            "harvested_at": report.harvested_at,
            "output": out.display().to_string(),
        }));
        return;
    }

    println!("{}", report.summary());
    if output::is_quiet() {
        return;
    }

    let s = Styled::new();
    for page in &report.failed_pages {
        eprintln!("  {} listing page {}: {}", s.warn_sym(), page.page, page.error);
    }
    for subject in &report.failed_subjects {
        eprintln!(
            "  {} {} ({}): {}",
            s.fail_sym(),
            subject.code,
            subject.href,
            subject.error
        );
    }
    eprintln!(
        "  {} Wrote {} records to {}",
        s.ok_sym(),
        report.records.len(),
        out.display()
    );
}

async fn render_progress(mut rx: ProgressReceiver) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("  {spinner} [{bar:30}] {pos}/{len} subjects {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    loop {
        let event = match rx.recv().await {
            Ok(event) => event.event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        match event {
            HarvestEventKind::PagesDiscovered {
                page_count,
                pages_selected,
            } => bar.set_message(format!(
                "reading {pages_selected} of {page_count} listing pages"
            )),
            HarvestEventKind::PageListed { subjects, .. } => bar.inc_length(u64::from(subjects)),
            HarvestEventKind::PageFailed { page, .. } => {
                bar.set_message(format!("listing page {page} failed"));
            }
            HarvestEventKind::SubjectHarvested { code, .. } => {
                bar.set_message(code);
                bar.inc(1);
            }
            HarvestEventKind::SubjectFailed { code, .. } => {
                bar.set_message(format!("{code} failed"));
                bar.inc(1);
            }
            HarvestEventKind::HarvestComplete { .. } => break,
        }
    }
    bar.finish_and_clear();
}
