//! plancc driver
//!
//! Loads a catalog and an operator tree, runs the produce/consume translation
//! and writes the generated code to a file or stdout.
//!
//! Usage: `plancc [config.yaml]`

use anyhow::Context;
use plancc_codegen::{builtin_registry, Translator};
use plancc_ir::{Catalog, Plan};
use tracing::info;

mod config;
mod logging;

use config::Config;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading config {}", path))?,
        None => Config::from_env()?,
    };
    config.apply_logging_env();
    logging::init()?;

    run(&config)
}

fn run(config: &Config) -> anyhow::Result<()> {
    let catalog_path = &config.input.catalog;
    let catalog_text = std::fs::read_to_string(catalog_path)
        .with_context(|| format!("reading catalog {}", catalog_path.display()))?;
    // YAML parser also accepts JSON catalogs
    let catalog: Catalog = serde_yaml::from_str(&catalog_text)
        .with_context(|| format!("parsing catalog {}", catalog_path.display()))?;

    let plan_path = &config.input.plan;
    let plan_text = std::fs::read_to_string(plan_path)
        .with_context(|| format!("reading plan {}", plan_path.display()))?;
    let plan = Plan::from_json(&plan_text)
        .with_context(|| format!("parsing plan {}", plan_path.display()))?;

    info!(
        relations = catalog.relations().count(),
        operators = plan.len(),
        fingerprint = %plan.fingerprint(),
        "inputs loaded"
    );

    let registry = builtin_registry().freeze();
    let code = Translator::new(&plan, &registry, &catalog)
        .with_config(config.codegen.clone())
        .translate()
        .context("translating plan")?;

    match &config.output.path {
        Some(path) => {
            std::fs::write(path, code.render())
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), lines = code.lines().len(), "generated code written");
        }
        None => print!("{}", code),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn demo(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(file)
    }

    #[test]
    fn test_run_demo_plan() {
        let output = std::env::temp_dir().join("plancc_demo_output.rs");
        let mut config = Config::default();
        config.input.catalog = demo("catalog.yaml");
        config.input.plan = demo("plan.json");
        config.output.path = Some(output.clone());

        run(&config).unwrap();

        let code = std::fs::read_to_string(&output).unwrap();
        let build_insert = code.find("ht3.entry(r_regionkey)").unwrap();
        let probe = code.find("ht3.get(&n_regionkey)").unwrap();
        assert!(build_insert < probe);
        assert!(code.contains("if r_name != types::Char::<25>::new(\"ASIA\") {"));
        assert!(code.contains("let key_sum = n_nationkey + r_regionkey;"));
        assert!(code.contains("println!(\"{}|{}|{}\", n_name, r_name, key_sum);"));

        std::fs::remove_file(output).ok();
    }

    #[test]
    fn test_run_missing_plan() {
        let mut config = Config::default();
        config.input.catalog = demo("catalog.yaml");
        config.input.plan = demo("does-not-exist.json");

        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("reading plan"));
    }
}
