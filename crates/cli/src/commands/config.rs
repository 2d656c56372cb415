//! `gitscribe config init` / `gitscribe config show`.

use std::path::Path;

use anyhow::{bail, Context, Result};

use gitscribe_core::AppConfig;

use crate::style;

pub fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, AppConfig::default_template())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{}",
        style::success(&format!("Wrote configuration to {}", path.display()))
    );
    Ok(())
}

pub fn run_show(path: &Path) -> Result<()> {
    let mut config = AppConfig::load_or_default(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    config.resolve_env_vars()?;

    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    println!("{}", style::header("Configuration"));
    println!("  file:               {}", source);
    println!();
    println!("{}", style::header("[llm]"));
    println!("  api_base:           {}", config.llm.api_base);
    println!("  model:              {}", config.llm.model);
    println!(
        "  api key ({}): {}",
        config.llm.api_key_env,
        style::presence(config.llm.api_key.is_some())
    );
    println!("  temperature:        {}", config.llm.temperature);
    println!("  max_tokens:         {}", config.llm.max_tokens);
    println!("  timeout_secs:       {}", config.llm.timeout_secs);
    println!("  max_retries:        {}", config.llm.max_retries);
    println!();
    println!("{}", style::header("[github]"));
    println!("  api_url:            {}", config.github.api_url);
    println!("  default_base:       {}", config.github.default_base);
    println!(
        "  token ({}): {}",
        config.github.token_env,
        style::presence(config.github.token.is_some())
    );
    println!();
    println!("{}", style::header("[resolve]"));
    println!("  concurrency:        {}", config.resolve.concurrency);
    println!("  max_tokens:         {}", config.resolve.max_tokens);
    println!(
        "  model:              {}",
        config.resolve.model.as_deref().unwrap_or(&config.llm.model)
    );

    if let Err(e) = config.validate() {
        println!();
        println!("{}", style::warn(&e.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        run_init(&path, false).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, AppConfig::default_template());
        assert!(AppConfig::load_from_file(&path).is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        let err = run_init(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        run_init(&path, true).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            AppConfig::default_template()
        );
    }

    #[test]
    fn test_show_without_file() {
        let dir = tempfile::tempdir().unwrap();
        run_show(&dir.path().join("missing.toml")).unwrap();
    }
}
