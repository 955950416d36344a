use crate::logger;
use crate::settings::RuntimeSettings;
use crate::GlobalOpts;
use colored::Colorize;
use stem_eject::{
    discover, ActionOutcome, Discovery, EjectError, EjectReport, Executor, GitTrackedFiles,
    Selection,
};
use tracing::debug;

/// Eject `package` (and optionally one of its variants) into the project.
///
/// Without a package the available selections are printed instead.
pub fn handle_eject(
    package: Option<String>,
    variant: Option<String>,
    settings: &RuntimeSettings,
    opts: &GlobalOpts,
) -> Result<(), String> {
    logger::step(&format!(
        "Discovering stem packages from {}",
        settings.start_dir.display()
    ));
    let discovery = discover(
        &settings.start_dir,
        &settings.reserved_prefix,
        settings.node_path.clone(),
    )
    .map_err(|e| e.to_string())?;

    let Some(package) = package else {
        report_failures(&discovery.failures);
        show_selections(&discovery);
        return Ok(());
    };

    if let Some(failure) = failure_of(&discovery, &package) {
        return Err(failure.to_string());
    }

    let ejectable = match discovery.index.select(&package, variant.as_deref()) {
        Ok(ejectable) => ejectable,
        Err(EjectError::Selection {
            selection,
            available,
        }) => {
            logger::warn(&format!("No ejectable found for {}", selection));
            print_selections(&available);
            return Ok(());
        }
        Err(e) => return Err(e.to_string()),
    };

    let git_path = settings.git_path()?;
    let tracked = GitTrackedFiles::new(git_path);
    let eject_settings = settings.eject_settings(&discovery);
    let executor = Executor::new(&eject_settings, &tracked);

    let selection = ejectable.selection();
    debug!(
        "Ejecting {} from {:?} into {:?}",
        selection, ejectable.package_root_dir, eject_settings.consumer_root
    );
    logger::spinner_start(&format!("Ejecting {}...", selection));
    let report = match executor.apply(ejectable) {
        Ok(report) => {
            logger::spinner_success(&format!(
                "Applied {} action(s) of {}",
                report.outcomes.len(),
                selection
            ));
            report
        }
        Err(e) => {
            logger::spinner_error(&format!("Eject of {} failed", selection));
            if matches!(e, EjectError::Action { .. }) {
                logger::info("Actions that completed were kept; fix the problem and re-run to resume");
            }
            return Err(e.to_string());
        }
    };

    print_report(&report, opts);
    Ok(())
}

fn failure_of<'a>(discovery: &'a Discovery, package: &str) -> Option<&'a EjectError> {
    discovery
        .failures
        .iter()
        .find(|failure| matches!(failure, EjectError::Usage { package: p, .. } if p == package))
}

fn print_report(report: &EjectReport, opts: &GlobalOpts) {
    for outcome in &report.outcomes {
        match outcome {
            ActionOutcome::Moved {
                relative_path,
                stats,
            } => logger::success(&format!(
                "Copied {} ({} new files, {} already present)",
                relative_path, stats.copied, stats.skipped
            )),
            ActionOutcome::Rewrote {
                import_path_old,
                import_path_new,
                report,
            } => {
                logger::success(&format!(
                    "Rewrote {} import(s) of '{}' to '{}' in {} file(s)",
                    report.imports_rewritten,
                    import_path_old,
                    import_path_new,
                    report.files_changed
                ));
                if opts.verbosity_level() > 0 {
                    for file in &report.changed_files {
                        logger::debug(&format!("  {}", file.display()));
                    }
                }
            }
        }
    }

    if report.manifest_updated {
        logger::success(&format!(
            "Removed {} from package.json",
            report.selection.package_name
        ));
    } else {
        logger::warn(&format!(
            "{} was not listed in package.json",
            report.selection.package_name
        ));
    }
    logger::success(&format!("Ejected {}", report.selection));
}

fn report_failures(failures: &[EjectError]) {
    for failure in failures {
        logger::error(&failure.to_string());
    }
}

fn show_selections(discovery: &Discovery) {
    if discovery.index.is_empty() {
        println!(
            "There are no ejectable stem packages in {}.",
            discovery.manifest_path.display()
        );
        return;
    }
    print_selections(&discovery.index.selections());
    println!();
    println!(
        "To eject, run:\n  {} eject <package> [variant]",
        "stem".bold().cyan()
    );
}

fn print_selections(selections: &[Selection]) {
    println!("{}", "Available ejectables:".bold().green());
    for selection in selections {
        match &selection.variant_name {
            Some(variant) => println!(
                "  stem eject {} {}",
                selection.package_name.bold().blue(),
                variant
            ),
            None => println!("  stem eject {}", selection.package_name.bold().blue()),
        }
    }
}
