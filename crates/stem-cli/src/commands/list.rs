use crate::logger;
use crate::settings::RuntimeSettings;
use colored::Colorize;
use std::path::Path;
use stem_eject::{discover, Discovery, Ejectable};

pub fn list_packages(settings: &RuntimeSettings) -> Result<(), String> {
    let discovery = discover(
        &settings.start_dir,
        &settings.reserved_prefix,
        settings.node_path.clone(),
    )
    .map_err(|e| e.to_string())?;

    for line in render(&discovery) {
        println!("{}", line);
    }
    for failure in &discovery.failures {
        logger::error(&failure.to_string());
    }
    Ok(())
}

fn render(discovery: &Discovery) -> Vec<String> {
    if discovery.package_names.is_empty() && discovery.failures.is_empty() {
        return vec![
            format!(
                "There are no stem packages declared in {}.",
                discovery.manifest_path.display()
            ),
            String::new(),
            "Stem packages are dependencies named @<org>/stem-<name>.".to_string(),
        ];
    }

    let mut lines = vec![format!("{}", "Stem packages:".bold().green())];
    for name in &discovery.package_names {
        let ejectables: Vec<&Ejectable> = discovery
            .index
            .iter()
            .filter(|e| &e.package_name == name)
            .collect();

        let mut header = format!(" {}:", name.bold().blue());
        if let Some(root) = ejectables.first().map(|e| e.package_root_dir.as_path()) {
            header.push_str(&format!(" {}", display_root(root).dimmed()));
        }
        lines.push(header);

        for ejectable in ejectables {
            let variant = ejectable.variant_name.as_deref().unwrap_or("(default)");
            lines.push(format!(
                "  - {} ({} action{})",
                variant,
                ejectable.actions.len(),
                if ejectable.actions.len() == 1 { "" } else { "s" }
            ));
        }
    }
    lines
}

fn display_root(root: &Path) -> String {
    format!("({})", root.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use stem_eject::EjectableIndex;
    use stem_manifest::{ActionList, EjectAction};

    fn ejectable(variant: Option<&str>, actions: usize) -> Ejectable {
        let mut list = ActionList::new();
        for i in 0..actions {
            list.push(EjectAction::MoveSourceCode {
                relative_path: format!("src/part{}", i),
            });
        }
        Ejectable {
            package_name: "@org/stem-widgets".to_string(),
            package_root_dir: PathBuf::from("/deps/stem-widgets"),
            variant_name: variant.map(str::to_string),
            actions: list,
        }
    }

    fn discovery(package_names: Vec<String>, ejectables: Vec<Ejectable>) -> Discovery {
        let Ok(index) = EjectableIndex::build(ejectables) else {
            panic!("index should build");
        };
        Discovery {
            consumer_root: PathBuf::from("/work/app"),
            manifest_path: PathBuf::from("/work/app/package.json"),
            package_names,
            index,
            failures: Vec::new(),
        }
    }

    #[test]
    fn lists_default_and_named_variants() {
        colored::control::set_override(false);
        let lines = render(&discovery(
            vec!["@org/stem-widgets".to_string()],
            vec![ejectable(None, 2), ejectable(Some("minimal"), 1)],
        ));
        assert_eq!(
            lines,
            vec![
                "Stem packages:",
                " @org/stem-widgets: (/deps/stem-widgets)",
                "  - (default) (2 actions)",
                "  - minimal (1 action)",
            ]
        );
    }

    #[test]
    fn empty_project_explains_naming() {
        colored::control::set_override(false);
        let lines = render(&discovery(Vec::new(), Vec::new()));
        assert!(lines[0].contains("/work/app/package.json"));
        assert!(lines[2].contains("stem-"));
    }
}
