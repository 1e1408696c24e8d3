//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("PersonaLearn Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let tools = vec![
        check_tool("yt-dlp", "--version", install_hint_ytdlp()),
        check_tool("ffmpeg", "-version", install_hint_ffmpeg()),
        check_tool("ffprobe", "-version", install_hint_ffmpeg()),
    ];
    print_section("External Tools", &tools);

    let keys = vec![
        check_openai_api_key(std::env::var("OPENAI_API_KEY").ok()),
        check_youtube_api_key(settings),
    ];
    print_section("API Configuration", &keys);

    let dirs = check_directories(settings);
    print_section("Directories", &dirs);

    let config = vec![check_config_file(config_path)];
    print_section("Configuration", &config);

    let checks: Vec<&CheckResult> = tools.iter().chain(&keys).chain(&dirs).chain(&config).collect();
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using PersonaLearn.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! PersonaLearn is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the OpenAI API key used for Whisper and query generation.
fn check_openai_api_key(key: Option<String>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the YouTube Data API key used for search.
fn check_youtube_api_key(settings: &Settings) -> CheckResult {
    match settings.youtube.resolve_api_key() {
        Some(key) => CheckResult::ok("YouTube API key", &format!("configured ({})", mask(&key))),
        None => CheckResult::error(
            "YouTube API key",
            "not set",
            "Set youtube.api_key in the config file or export YOUTUBE_API_KEY",
        ),
    }
}

/// Check cache directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let cache_dir = settings.cache_dir();
    if cache_dir.exists() {
        results.push(CheckResult::ok("Cache directory", &cache_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Cache directory",
            &format!("{} (will be created)", cache_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let transcriptions_dir = settings.transcriptions_dir();
    let cached = std::fs::read_dir(&transcriptions_dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "srt"))
                .count()
        })
        .unwrap_or(0);
    results.push(CheckResult::ok(
        "Transcriptions",
        &format!("{} cached in {}", cached, transcriptions_dir.display()),
    ));

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: personalearn config init",
        )
    }
}

/// Show the first and last characters of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_openai_key_checks() {
        let ok = check_openai_api_key(Some("sk-abcdefghijklmnopqrstuvwxyz".to_string()));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert_eq!(ok.message, "configured (sk-abcd...wxyz)");

        assert_eq!(check_openai_api_key(Some(String::new())).status, CheckStatus::Error);
        assert_eq!(check_openai_api_key(Some("token".to_string())).status, CheckStatus::Warning);
        assert_eq!(check_openai_api_key(None).status, CheckStatus::Error);
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask("short"), "***");
    }

    #[test]
    fn test_missing_config_file_is_warning() {
        let result = check_config_file(Path::new("/nonexistent/personalearn/config.toml"));
        assert_eq!(result.status, CheckStatus::Warning);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("ffmpeg version 6.1", 6), "ffmpeg...");
        assert_eq!(truncate("yt-dlp", 50), "yt-dlp");
    }
}
