use std::path::PathBuf;
use std::str::FromStr;

use clap::{Arg, Command};
use fieldnav::logging::{self, LogConfig, LogOutput};
use fieldnav::models::{cast_sector_distances, is_colliding, Vector2, SECTOR_ANGLE_DEG};
use fieldnav::realtime::{run_realtime, RealtimeConfig, SharedSimulation};
use fieldnav::scenario::ScenarioConfig;
use fieldnav::simulation::{RunSummary, SimulationEngine};

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("fieldnav")
        .version("0.1.0")
        .about("セクターセンサー車両シミュレーション (Field Navigation Simulation)")
        .long_about("障害物のある2次元フィールドで、6セクター測距センサーと反応型制御則により\n\
                     目標位置へ向かう車両をシミュレーションします。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、組み込みの坑内フィールドで実行されます。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with_all(["probe", "realtime"])
        )
        .arg(
            Arg::new("probe")
                .long("probe")
                .value_name("X,Y")
                .help("指定座標のセクター距離と衝突判定を表示して終了")
                .conflicts_with("realtime")
        )
        .arg(
            Arg::new("dt")
                .long("dt")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(f64))
                .help("時間刻みを上書き")
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .action(clap::ArgAction::SetTrue)
                .help("壁時計の経過時間でシミュレーションを進める")
        )
        .arg(
            Arg::new("time-scale")
                .long("time-scale")
                .value_name("FACTOR")
                .value_parser(clap::value_parser!(f64))
                .default_value("1.0")
                .help("実時間モードの時間倍率")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルのディレクトリ")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    // ログ設定
    let log_config = match build_log_config(&matches, verbose_level) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(2);
        }
    };

    let _log_guard = match logging::init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ログ初期化エラー: {}", e);
            std::process::exit(1);
        }
    };

    println!("セクターセンサー車両シミュレーション - fieldnav v0.1.0");
    println!();

    if let Err(e) = run(&matches, verbose_level) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// コマンドライン引数からログ設定を組み立てる（--log-level は -v より優先）
fn build_log_config(matches: &clap::ArgMatches, verbose_level: u8) -> Result<LogConfig, String> {
    let mut config = LogConfig::for_verbosity(verbose_level);

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.level = logging::parse_log_level(level)?;
    }
    if let Some(output) = matches.get_one::<String>("log-output") {
        config.output = LogOutput::from_str(output)?;
    }
    if let Some(dir) = matches.get_one::<String>("log-dir") {
        config.log_dir = PathBuf::from(dir);
    }

    Ok(config)
}

fn run(matches: &clap::ArgMatches, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    // シナリオの読み込み
    let mut scenario = match matches.get_one::<String>("scenario") {
        Some(path) => {
            let scenario = ScenarioConfig::from_file(path)?;
            if verbose_level > 0 {
                println!("シナリオファイル読み込み完了: {}", path);
            }
            scenario
        }
        None => ScenarioConfig::builtin(),
    };

    if let Some(dt) = matches.get_one::<f64>("dt") {
        scenario.sim.dt_s = *dt;
        scenario.validate()?;
    }

    // 情報表示のみの場合
    if matches.get_flag("info") {
        scenario.print_summary();
        return Ok(());
    }

    if let Some(probe) = matches.get_one::<String>("probe") {
        return probe_point(&scenario, probe);
    }

    scenario.print_summary();
    println!();

    let summary = if matches.get_flag("realtime") {
        let time_scale = matches.get_one::<f64>("time-scale").copied().unwrap_or(1.0);
        execute_realtime(scenario, verbose_level, time_scale)?
    } else {
        let mut engine = SimulationEngine::new(scenario, verbose_level)?;
        engine.run()
    };

    print_run_summary(&summary);
    Ok(())
}

/// 実時間モードでの実行
fn execute_realtime(
    scenario: ScenarioConfig,
    verbose_level: u8,
    time_scale: f64,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let config = RealtimeConfig::from_step(scenario.sim.dt_s, time_scale, scenario.sim.t_max_s)?;
    let shared = SharedSimulation::new(SimulationEngine::new(scenario, verbose_level)?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    Ok(runtime.block_on(run_realtime(shared, config)))
}

/// 指定座標でのセンサー計測と衝突判定を表示
fn probe_point(scenario: &ScenarioConfig, probe: &str) -> Result<(), Box<dyn std::error::Error>> {
    let point = parse_point(probe)?;
    let field = scenario.field_config()?;

    let reading = cast_sector_distances(
        &point,
        field.obstacles(),
        field.size(),
        scenario.vehicle.max_detect_distance,
    );

    println!("=== 座標 ({:.1}, {:.1}) ===", point.x, point.y);
    println!("フィールド内: {}", point.is_in_field(field.width(), field.height()));
    println!("障害物と衝突: {}", is_colliding(&point, field.obstacles()));
    println!("セクター距離:");
    for (sector, distance) in reading.as_slice().iter().enumerate() {
        let start = sector as f64 * SECTOR_ANGLE_DEG;
        println!("  [{}] {:>3.0}°-{:>3.0}°: {:.1}", sector, start, start + SECTOR_ANGLE_DEG, distance);
    }
    println!("最も空いているセクター: {}", reading.clearest_sector());

    Ok(())
}

fn parse_point(s: &str) -> Result<Vector2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("座標の形式が不正です (X,Y): {}", s))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("X座標が不正です: {}", x))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("Y座標が不正です: {}", y))?;
    Ok(Vector2::new(x, y))
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("=== 実行結果 ===");
    println!("終了理由: {:?}", summary.outcome);
    println!("経過時間: {:.1}秒", summary.time);
    println!("ステップ数: {}", summary.steps);
    println!("走行距離: {:.1}", summary.distance_travelled);
    println!("最終位置: ({:.0}, {:.0})", summary.final_position.x, summary.final_position.y);
    println!("接触回数: {}", summary.collisions);
    println!("回避転針: {}", summary.avoidance_turns);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_rejects_tiny_time_step() {
        let mut scenario = ScenarioConfig::builtin();
        scenario.sim.dt_s = 1e-12;
        assert!(scenario.validate().is_ok());

        let err = execute_realtime(scenario, 0, 1.0).unwrap_err();
        assert!(err.to_string().contains("minimum"), "{}", err);
    }

    #[test]
    fn test_realtime_rejects_bad_time_scale() {
        assert!(execute_realtime(ScenarioConfig::builtin(), 0, 0.0).is_err());
        assert!(execute_realtime(ScenarioConfig::builtin(), 0, f64::NAN).is_err());
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("12.5, 40").unwrap(), Vector2::new(12.5, 40.0));
        assert!(parse_point("12.5").is_err());
        assert!(parse_point("a,1").is_err());
    }
}
