//! Integration tests for stem

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;
use which::which;

const CONSUMER_MANIFEST: &str = r#"{
  "name": "consumer",
  "private": true,
  "dependencies": {
    "@org/stem-widgets": "^1.0.0",
    "react": "^18.2.0"
  }
}
"#;

const WIDGETS_EJECT_CONFIG: &str = r#"{
  "ejectables": [
    {
      "actions": [
        { "action": "moveSourceCode", "relativePath": "src/widgets" },
        {
          "action": "modifyImportPaths",
          "importPathOld": "@org/stem-widgets/widgets",
          "importPathNew": "./widgets"
        }
      ]
    },
    {
      "name": "minimal",
      "actions": [
        { "action": "moveSourceCode", "relativePath": "src/widgets/core" }
      ]
    }
  ]
}
"#;

const WIDGETS_EJECT_SCRIPT: &str = r#"const widgets = 'src/widgets';

export default {
  ejectables: [
    {
      actions: [
        { action: 'moveSourceCode', relativePath: widgets },
        {
          action: 'modifyImportPaths',
          importPathOld: '@org/stem-widgets/widgets',
          importPathNew: './widgets',
        },
      ],
    },
    {
      name: 'minimal',
      actions: [{ action: 'moveSourceCode', relativePath: `${widgets}/core` }],
    },
  ],
};
"#;

/// A throwaway consumer project with one installed stem package
struct ProjectHarness {
    home: TempDir,
    project: PathBuf,
}

impl ProjectHarness {
    fn new(manifest: &str) -> io::Result<Self> {
        let home = TempDir::new()?;
        let project = home.path().join("app");

        write(&project.join("package.json"), manifest)?;
        write(&project.join(".gitignore"), "node_modules\n")?;
        write(
            &project.join("src/main.ts"),
            "import { Card } from '@org/stem-widgets/widgets'\n\nCard()\n",
        )?;
        write(
            &project.join("src/pages/home/index.tsx"),
            "import {\n  Grid,\n} from \"@org/stem-widgets/widgets\"\n",
        )?;

        let widgets = project.join("node_modules/@org/stem-widgets");
        write(
            &widgets.join("package.json"),
            r#"{ "name": "@org/stem-widgets", "version": "1.0.0" }"#,
        )?;
        write(&widgets.join("eject.config.json"), WIDGETS_EJECT_CONFIG)?;
        write(
            &widgets.join("src/widgets/index.ts"),
            "export * from './core/card'\n",
        )?;
        write(
            &widgets.join("src/widgets/core/card.ts"),
            "export const Card = () => null\n",
        )?;

        Ok(Self { home, project })
    }

    fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("stem");
        cmd.env("HOME", self.home.path());
        cmd.env("STEM_CONFIG", self.home.path().join("stem.toml"));
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("RUST_LOG");
        cmd.current_dir(&self.project);
        cmd
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.project.join(relative)).unwrap_or_default()
    }

    /// Ship the widgets config as an ES module instead of JSON
    fn use_script_config(&self) -> io::Result<()> {
        let widgets = self.project.join("node_modules/@org/stem-widgets");
        fs::remove_file(widgets.join("eject.config.json"))?;
        write(
            &widgets.join("package.json"),
            r#"{ "name": "@org/stem-widgets", "version": "1.0.0", "type": "module" }"#,
        )?;
        write(&widgets.join("eject.config.js"), WIDGETS_EJECT_SCRIPT)
    }

    fn git_init(&self) -> bool {
        let Ok(git) = which("git") else {
            return false;
        };
        let run = |args: &[&str]| {
            StdCommand::new(&git)
                .args(args)
                .current_dir(&self.project)
                .output()
                .is_ok_and(|out| out.status.success())
        };
        run(&["init", "-q"]) && run(&["add", "."])
    }
}

fn write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn stem_cmd(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("stem");
    cmd.env("HOME", home);
    cmd.env("STEM_CONFIG", home.join("stem.toml"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_version() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stem"));
}

#[test]
fn test_help() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Eject source code from stem packages"));
}

#[test]
fn test_invalid_command() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path()).arg("invalid").assert().failure();
}

#[test]
fn test_config_path_honours_override() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stem.toml"));
}

#[test]
fn test_config_set_then_get() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path())
        .args(["config", "set", "source-root", "app"])
        .assert()
        .success();
    stem_cmd(home.path())
        .args(["config", "get", "source-root"])
        .assert()
        .success()
        .stdout(predicate::str::diff("app\n"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    stem_cmd(home.path())
        .args(["config", "set", "cache-path", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_missing_manifest_fails() {
    let Ok(home) = TempDir::new() else {
        return;
    };
    let empty = home.path().join("nowhere");
    if fs::create_dir_all(&empty).is_err() {
        return;
    }
    // a manifest above the temp dir would be found by the upward search
    if empty.ancestors().skip(1).any(|dir| dir.join("package.json").is_file()) {
        return;
    }
    stem_cmd(home.path())
        .arg("--root")
        .arg(&empty)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Couldn't find package.json"));
}

#[test]
fn test_list_without_stem_packages() {
    let Ok(env) = ProjectHarness::new(r#"{ "dependencies": { "react": "^18.2.0" } }"#) else {
        return;
    };
    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("There are no stem packages declared"));
}

#[test]
fn test_list_shows_ejectables() {
    let Ok(env) = ProjectHarness::new(CONSUMER_MANIFEST) else {
        return;
    };
    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("@org/stem-widgets"))
        .stdout(predicate::str::contains("(default) (2 actions)"))
        .stdout(predicate::str::contains("minimal (1 action)"));
}

#[test]
fn test_list_shows_ejectables_from_script_config() {
    if which("node").is_err() {
        return;
    }
    let Ok(env) = ProjectHarness::new(CONSUMER_MANIFEST) else {
        return;
    };
    if env.use_script_config().is_err() {
        return;
    }
    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("@org/stem-widgets"))
        .stdout(predicate::str::contains("(default) (2 actions)"))
        .stdout(predicate::str::contains("minimal (1 action)"));
}

#[test]
fn test_eject_without_package_lists_selections() {
    let Ok(env) = ProjectHarness::new(CONSUMER_MANIFEST) else {
        return;
    };
    env.command()
        .arg("eject")
        .assert()
        .success()
        .stdout(predicate::str::contains("stem eject @org/stem-widgets minimal"));
    assert_eq!(env.read("package.json"), CONSUMER_MANIFEST);
}

#[test]
fn test_eject_unknown_variant_changes_nothing() {
    let Ok(env) = ProjectHarness::new(CONSUMER_MANIFEST) else {
        return;
    };
    env.command()
        .args(["eject", "@org/stem-widgets", "full"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No ejectable found for @org/stem-widgets full"))
        .stdout(predicate::str::contains("stem eject @org/stem-widgets minimal"));
    assert_eq!(env.read("package.json"), CONSUMER_MANIFEST);
    assert!(!env.project.join("src/widgets").exists());
}

#[test]
fn test_eject_widgets_end_to_end() {
    let Ok(env) = ProjectHarness::new(CONSUMER_MANIFEST) else {
        return;
    };
    if !env.git_init() {
        return;
    }

    env.command()
        .args(["eject", "@org/stem-widgets"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Ejected @org/stem-widgets"));

    assert_eq!(env.read("src/widgets/index.ts"), "export * from './core/card'\n");
    assert_eq!(
        env.read("src/widgets/core/card.ts"),
        "export const Card = () => null\n"
    );
    assert_eq!(
        env.read("src/main.ts"),
        "import { Card } from './widgets'\n\nCard()\n"
    );
    assert_eq!(
        env.read("src/pages/home/index.tsx"),
        "import {\n  Grid,\n} from \"../../widgets\"\n"
    );
    assert_eq!(
        env.read("package.json"),
        "{\n  \"name\": \"consumer\",\n  \"private\": true,\n  \"dependencies\": {\n    \"react\": \"^18.2.0\"\n  }\n}\n"
    );
}
