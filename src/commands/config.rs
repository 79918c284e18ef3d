use anyhow::{Context, Result};
use crossterm::style::Color;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::config::{
    ConfigLayer, ConfigLayers, ENV_PAT, EffectiveConfig, Resolved, censor_pat,
    global_config_path, is_placeholder, local_config_path,
};
use crate::ui::output::{PanelRow, render_panel};

/// Interactive wizard writing the global config file, or `./ado.json` with `local`.
pub fn init(local: bool) -> Result<()> {
    let path = if local {
        local_config_path()?
    } else {
        global_config_path()?
    };
    let existing = ConfigLayer::load(&path);

    println!("Configuring {}", path.display());
    println!("Press Enter to keep the value in brackets.");
    println!();

    let stdin = io::stdin();
    let layer = prompt_config(&mut stdin.lock(), &mut io::stdout(), &existing, local)?;
    layer.save(&path)?;

    println!();
    println!("Configuration saved to {}", path.display());
    if layer.pat.is_none() && std::env::var(ENV_PAT).is_err() {
        println!();
        println!("Don't forget to set your PAT:");
        println!("  export {ENV_PAT}=\"your-personal-access-token\"");
    }
    Ok(())
}

/// Ask for every field, keeping `existing` values on empty answers.
/// The PAT is never asked for (nor kept) in a local file.
fn prompt_config<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    existing: &ConfigLayer,
    local: bool,
) -> Result<ConfigLayer> {
    let collection_url = prompt(
        input,
        output,
        "Collection URL (e.g. https://dev.azure.com/org)",
        existing.collection_url.as_deref(),
    )?
    .or_else(|| existing.collection_url.clone());
    let project =
        prompt(input, output, "Project", existing.project.as_deref())?.or_else(|| existing.project.clone());
    let repo = prompt(input, output, "Default repository", existing.repo.as_deref())?
        .or_else(|| existing.repo.clone());

    let pat = if local {
        None
    } else {
        let shown = existing.pat.as_deref().map(censor_pat);
        prompt(input, output, "Personal access token", shown.as_deref())?
            .or_else(|| existing.pat.clone())
    };

    let insecure_default = existing.insecure.unwrap_or(false);
    let insecure_hint = if insecure_default { "Y/n" } else { "y/N" };
    let insecure = match prompt(
        input,
        output,
        &format!("Accept invalid TLS certificates? [{insecure_hint}]"),
        None,
    )? {
        Some(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
        None => insecure_default,
    };

    Ok(ConfigLayer {
        pat,
        collection_url,
        project,
        repo,
        insecure: insecure.then_some(true),
    })
}

/// Print `label [current]: ` and read one trimmed line. Blank or EOF is `None`.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    current: Option<&str>,
) -> Result<Option<String>> {
    match current {
        Some(current) => write!(output, "{label} [{current}]: ")?,
        None => write!(output, "{label}: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read answer")?;
    let answer = line.trim();

    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

/// Print the effective configuration with the source of every value.
pub fn config_show() -> Result<()> {
    let layers = ConfigLayers::load()?;
    let local_path = local_config_path()?;
    let global_path = global_config_path()?;

    let effective = layers.effective();
    let mut rows = effective_rows(&effective);
    rows.push(file_row("Local file", &local_path));
    rows.push(file_row("Global file", &global_path));

    match effective.validate() {
        Ok(_) => render_panel("ado configuration", &rows, Color::Green),
        Err(e) => {
            render_panel("ado configuration", &rows, Color::Yellow)?;
            println!();
            println!("{e}");
            Ok(())
        }
    }
}

fn effective_rows(effective: &EffectiveConfig) -> Vec<PanelRow> {
    let text_row = |label: &str, resolved: &Resolved<String>| {
        let row = PanelRow::new(label, resolved.value.clone()).note(resolved.source.label());
        if is_placeholder(&resolved.value) {
            row.note(format!("{}, not configured", resolved.source.label()))
        } else {
            row
        }
    };

    let pat = match &effective.pat {
        Some(resolved) => PanelRow::new("PAT", censor_pat(&resolved.value)).note(resolved.source.label()),
        None => PanelRow::new("PAT", "missing").note(format!("set {ENV_PAT}")),
    };

    vec![
        pat,
        text_row("Collection URL", &effective.collection_url),
        text_row("Project", &effective.project),
        text_row("Repository", &effective.repo),
        PanelRow::new("Insecure TLS", effective.insecure.value.to_string())
            .note(effective.insecure.source.label()),
    ]
}

fn file_row(label: &str, path: &Path) -> PanelRow {
    let state = if path.exists() { "present" } else { "not found" };
    PanelRow::new(label, path.display().to_string()).note(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_prompts(answers: &str, existing: &ConfigLayer, local: bool) -> (ConfigLayer, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let layer = prompt_config(&mut input, &mut output, existing, local).unwrap();
        (layer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_prompt_config_global() {
        let (layer, output) = run_prompts(
            "https://dev.azure.com/acme\nWeb\nweb-app\nsecret-token-1234\ny\n",
            &ConfigLayer::default(),
            false,
        );

        assert_eq!(layer.collection_url.as_deref(), Some("https://dev.azure.com/acme"));
        assert_eq!(layer.project.as_deref(), Some("Web"));
        assert_eq!(layer.repo.as_deref(), Some("web-app"));
        assert_eq!(layer.pat.as_deref(), Some("secret-token-1234"));
        assert_eq!(layer.insecure, Some(true));
        assert!(output.contains("Personal access token: "));
    }

    #[test]
    fn test_prompt_config_keeps_existing_on_blank_answers() {
        let existing = ConfigLayer {
            pat: Some("abcd12345678wxyz".to_string()),
            collection_url: Some("https://dev.azure.com/acme".to_string()),
            project: Some("Web".to_string()),
            repo: Some("web-app".to_string()),
            insecure: None,
        };
        let (layer, output) = run_prompts("\n\nother-repo\n\n\n", &existing, false);

        assert_eq!(layer.collection_url, existing.collection_url);
        assert_eq!(layer.repo.as_deref(), Some("other-repo"));
        assert_eq!(layer.pat, existing.pat);
        assert_eq!(layer.insecure, None);
        // the stored token is shown redacted
        assert!(output.contains("[abcd********wxyz]"));
        assert!(!output.contains("abcd12345678wxyz"));
    }

    #[test]
    fn test_prompt_config_local_never_asks_for_pat() {
        let existing = ConfigLayer {
            pat: Some("leaked-token-value".to_string()),
            ..Default::default()
        };
        let (layer, output) = run_prompts("https://x\nP\nR\nn\n", &existing, true);

        assert!(layer.pat.is_none());
        assert!(!output.contains("Personal access token"));
        assert_eq!(layer.insecure, None);
    }

    #[test]
    fn test_prompt_config_eof_keeps_everything() {
        let existing = ConfigLayer {
            project: Some("Web".to_string()),
            insecure: Some(true),
            ..Default::default()
        };
        let (layer, _) = run_prompts("", &existing, false);
        assert_eq!(layer, existing);
    }

    #[test]
    fn test_effective_rows_redact_pat_and_show_sources() {
        let layers = ConfigLayers {
            env: ConfigLayer {
                pat: Some("abcd12345678wxyz".to_string()),
                ..Default::default()
            },
            local: ConfigLayer {
                project: Some("Web".to_string()),
                ..Default::default()
            },
            global: ConfigLayer::default(),
        };
        let rows = effective_rows(&layers.effective());

        assert_eq!(rows[0].value, "abcd********wxyz");
        assert_eq!(rows[0].note.as_deref(), Some("env"));
        assert_eq!(rows[2].value, "Web");
        assert_eq!(rows[2].note.as_deref(), Some("local (ado.json)"));
        assert_eq!(rows[3].note.as_deref(), Some("default, not configured"));
    }

    #[test]
    fn test_effective_rows_missing_pat() {
        let rows = effective_rows(&ConfigLayers::default().effective());
        assert_eq!(rows[0].value, "missing");
    }
}
