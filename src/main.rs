use clap::{value_parser, Arg, ArgMatches, Command};
use std::str::FromStr;

use shiprisk::error::{Result, RiskError};
use shiprisk::logging::{init_logging, level_for_verbosity, parse_log_level, LogConfig, LogOutput};
use shiprisk::scenario::{Preset, ScenarioConfig};
use shiprisk::simulation::RiskEstimator;

fn main() {
    let matches = build_cli().get_matches();
    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| level_for_verbosity(verbose_level)),
        output: *matches.get_one::<LogOutput>("log-output").unwrap_or(&LogOutput::Console),
        ..LogConfig::default()
    };

    // ファイル出力時はguardを保持し続ける
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&matches, verbose_level) {
        eprintln!("{}", error_message(&e));
        std::process::exit(1);
    }
}

/// エラー表示（設定エラーの場合は違反したパラメータも示す）
fn error_message(e: &RiskError) -> String {
    match e.parameter() {
        Some(parameter) => format!("エラー: {}\n違反したパラメータ: {}", e, parameter),
        None => format!("エラー: {}", e),
    }
}

fn build_cli() -> Command {
    Command::new("shiprisk")
        .version("0.1.0")
        .about("船舶衝突リスク推定 (Ship Collision Risk Estimation)")
        .long_about("モンテカルロ法による船舶衝突リスク推定ツール\n\
                     等速直線運動する自船と、ランダムに生成した他船との最接近距離から衝突確率を推定します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、プリセットまたはデフォルト設定で実行されます。")
        )
        .arg(
            Arg::new("preset")
                .short('p')
                .long("preset")
                .value_name("NAME")
                .value_parser(Preset::from_str)
                .help("閾値プリセット (standard: 0.2, cautious: 0.5)")
        )
        .arg(
            Arg::new("trials")
                .long("trials")
                .value_name("N")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .help("試行数")
        )
        .arg(
            Arg::new("ships")
                .long("ships")
                .value_name("N")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .help("1試行あたりの他船数")
        )
        .arg(
            Arg::new("area")
                .long("area")
                .value_name("SIZE")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .help("サンプリング領域の半幅")
        )
        .arg(
            Arg::new("max-speed")
                .long("max-speed")
                .value_name("SPEED")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .help("他船の最大速度")
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .value_name("DIST")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .help("衝突とみなす最接近距離")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64))
                .help("乱数シード（指定すると結果を再現可能）")
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("並列ワーカー数 (1: 逐次実行)")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("設定情報のみ表示して終了")
        )
        .arg(
            Arg::new("timing")
                .long("timing")
                .action(clap::ArgAction::SetTrue)
                .help("実行時間を表示")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: CPA値を含むデバッグ)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .value_parser(LogOutput::from_str)
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
}

/// 設定の組み立て: デフォルト < プリセット < シナリオファイル < 個別オプション
fn resolve_scenario(matches: &ArgMatches) -> Result<ScenarioConfig> {
    let mut scenario = match matches.get_one::<String>("scenario") {
        Some(path) => ScenarioConfig::from_file(path)?,
        None => {
            let preset = matches.get_one::<Preset>("preset").copied().unwrap_or(Preset::Standard);
            ScenarioConfig {
                sim: preset.config(),
                ..ScenarioConfig::default()
            }
        }
    };

    if let Some(&n) = matches.get_one::<i64>("trials") {
        scenario.sim.num_trials = n;
    }
    if let Some(&n) = matches.get_one::<i64>("ships") {
        scenario.sim.num_other_ships = n;
    }
    if let Some(&v) = matches.get_one::<f64>("area") {
        scenario.sim.area_size = v;
    }
    if let Some(&v) = matches.get_one::<f64>("max-speed") {
        scenario.sim.max_speed = v;
    }
    if let Some(&v) = matches.get_one::<f64>("threshold") {
        scenario.sim.threshold_distance = v;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        scenario.execution.seed = Some(seed);
    }
    if let Some(&workers) = matches.get_one::<usize>("workers") {
        scenario.execution.workers = workers;
    }

    scenario.validate()?;
    Ok(scenario)
}

fn run(matches: &ArgMatches, verbose_level: u8) -> Result<()> {
    let scenario = resolve_scenario(matches)?;

    if matches.get_flag("info") {
        scenario.print_summary();
        return Ok(());
    }

    if verbose_level > 0 {
        scenario.print_summary();
        println!();
    }

    let estimator = RiskEstimator::new(scenario.sim, scenario.execution, verbose_level)?;
    let report = estimator.run()?;

    println!("Estimated probability of collision: {:.2}%", report.percentage());

    if verbose_level > 0 {
        println!("  衝突試行数: {}/{}", report.collisions, report.num_trials);
        println!("  標準誤差: {:.2}%", report.std_error * 100.0);
        println!("  シード値: {} (ワーカー: {})", report.seed, report.workers);
    }
    if matches.get_flag("timing") {
        println!("Elapsed: {:.4} seconds", report.elapsed.as_secs_f64());
    }

    Ok(())
}
