//! # Logging モジュール
//!
//! 車両シミュレーションのログ出力を管理します。
//!
//! コンソールには人が読みやすい compact 形式、ファイルには解析しやすい JSON 形式で
//! 出力します。ファイル出力は tracing-appender の日次ローテーションと非同期書き込みを
//! 使用し、シミュレーションの刻み処理を妨げません。
//!
//! 既定ではこのクレートのイベントのみ指定レベルで出力し、依存クレートは WARN 以上に
//! 絞ります。環境変数 `RUST_LOG` が設定されている場合はそちらが優先されます。
//!
//! 出力先は `console`、`file`（`<log_dir>/fieldnav.YYYY-MM-DD`）、`both` から選択します。

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// ログの出力先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        self != LogOutput::Console
    }

    fn writes_console(self) -> bool {
        self != LogOutput::File
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "stderr" | "stdout" => Ok(Self::Console),
            "file" => Ok(Self::File),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown log output '{}' (expected console, file or both)", other)),
        }
    }
}

impl Display for LogOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogOutput::Console => "console",
            LogOutput::File => "file",
            LogOutput::Both => "both",
        };
        f.write_str(name)
    }
}

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// このクレートのイベントに適用するレベル
    pub level: Level,
    pub output: LogOutput,
    /// JSON ログファイルの出力先ディレクトリ
    pub log_dir: PathBuf,
    /// ローテーションファイル名の接頭辞
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_verbosity(0)
    }
}

impl LogConfig {
    /// `-v` の回数からレベルを決めた設定（0: INFO, 1: DEBUG, 2以上: TRACE）
    pub fn for_verbosity(verbose_level: u8) -> Self {
        Self {
            level: level_for_verbosity(verbose_level),
            output: LogOutput::Console,
            log_dir: PathBuf::from("logs"),
            file_prefix: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    /// `RUST_LOG` 未設定時に使うフィルタ指定
    ///
    /// 例: レベル DEBUG なら `warn,fieldnav=debug`
    pub fn filter_directive(&self) -> String {
        format!(
            "warn,{}={}",
            env!("CARGO_CRATE_NAME"),
            self.level.as_str().to_ascii_lowercase()
        )
    }
}

/// グローバルな tracing サブスクライバを登録します
///
/// ファイル出力時は非同期ライターの `WorkerGuard` を返します。ガードを破棄すると
/// 未書き込みの行がフラッシュされ、以降のファイル出力は止まるため、`main` の終了まで
/// 保持してください。二重に初期化した場合はエラーになります。
///
/// ```no_run
/// use fieldnav::logging::{init_logging, LogConfig, LogOutput};
///
/// let config = LogConfig {
///     output: LogOutput::Both,
///     ..LogConfig::for_verbosity(1)
/// };
/// let _guard = init_logging(&config)?;
/// tracing::info!("VEHICLE_STATUS");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())?,
    };

    let console_layer = config
        .output
        .writes_console()
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false).compact());

    let mut guard = None;
    let file_layer = if config.output.writes_file() {
        ensure_log_directory(&config.log_dir)?;
        let (writer, worker_guard) =
            non_blocking(rolling::daily(&config.log_dir, &config.file_prefix));
        guard = Some(worker_guard);
        Some(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(false)
                .with_ansi(false),
        )
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!(
        level = %config.level,
        output = %config.output,
        log_dir = %config.log_dir.display(),
        "ログ出力を初期化しました"
    );

    Ok(guard)
}

/// `--log-level` の値を解析（大文字小文字は区別しない）
pub fn parse_log_level(value: &str) -> Result<Level, String> {
    Level::from_str(value.trim())
        .map_err(|_| format!("unknown log level '{}' (expected trace, debug, info, warn or error)", value))
}

/// `-v` の回数に対応するレベル
pub fn level_for_verbosity(verbose_level: u8) -> Level {
    match verbose_level {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// ログディレクトリがなければ作成
pub fn ensure_log_directory(log_dir: &Path) -> std::io::Result<()> {
    if !log_dir.is_dir() {
        std::fs::create_dir_all(log_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_output_parsing() {
        assert_eq!("Console".parse::<LogOutput>(), Ok(LogOutput::Console));
        assert_eq!(" file ".parse::<LogOutput>(), Ok(LogOutput::File));
        assert_eq!("both".parse::<LogOutput>(), Ok(LogOutput::Both));
        assert!("syslog".parse::<LogOutput>().is_err());
        assert_eq!(LogOutput::Both.to_string(), "both");
    }

    #[test]
    fn test_output_targets() {
        assert!(LogOutput::Both.writes_console() && LogOutput::Both.writes_file());
        assert!(!LogOutput::Console.writes_file());
        assert!(!LogOutput::File.writes_console());
    }

    #[test]
    fn test_log_level_values() {
        assert_eq!(parse_log_level("trace"), Ok(Level::TRACE));
        assert_eq!(parse_log_level("WARN"), Ok(Level::WARN));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_verbosity_and_filter() {
        assert_eq!(LogConfig::default().level, Level::INFO);
        assert_eq!(LogConfig::for_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogConfig::for_verbosity(5).level, Level::TRACE);
        assert_eq!(LogConfig::for_verbosity(1).filter_directive(), "warn,fieldnav=debug");
        assert_eq!(LogConfig::default().file_prefix, "fieldnav");
    }
}
