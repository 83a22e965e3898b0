use std::str::FromStr;
use std::time::Duration;

use clap::{Arg, Command};
use radarfield::logging::{LogConfig, LogOutput, init_logging, parse_log_level};
use radarfield::models::*;
use radarfield::scenario::ScenarioConfig;
use radarfield::simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("radarfield")
        .version(env!("CARGO_PKG_VERSION"))
        .about("同心円レーダー配置エンジン (Radar Field)")
        .long_about("距離でリング、方位でスロットを決定し、\n\
                     アイテムを重複なく同心円上に配置します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みのデモ配置を実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
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
                .help("ログファイルの出力ディレクトリ")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or_else(|| LogConfig::level_for_verbosity(verbose_level)),
        output,
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: ログ初期化に失敗しました: {}", e);
            std::process::exit(1);
        }
    };

    println!("同心円レーダー配置エンジン - radarfield v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if matches.get_flag("test") {
        println!("=== デモ配置モード ===");
        if let Err(e) = run_demo() {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

/// 2リングのフィールドにいくつかのアイテムを配置して表示
fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut field: RadarField<String> = RadarField::new(FieldLayout {
        ring_count: 2,
        min_distance: 0.0,
        max_distance: 100.0,
        item_footprint: 5.0,
        spacing: 2.0,
        seed: Some(2018),
        ..FieldLayout::default()
    })?;
    println!("フィールドが作成されました: {} リング, 容量 {}", field.rings().len(), field.capacity());

    let items = vec![
        Item::new("u1", "Alice".to_string()).with_distance(30.0).with_angle(0.0),
        Item::new("u2", "Bob".to_string()).with_distance(80.0),
        Item::new("u3", "Carol".to_string()).with_distance(45.0).with_angle(120.0),
        Item::new("u1", "Alice (dup)".to_string()).with_distance(10.0),
        Item::new("u4", "Dave".to_string()).with_distance(150.0),
        Item::new("u5", "Eve".to_string()),
    ];
    place_items(&mut field, items);

    println!();
    print_rings(&field);

    field.remove("u3")?;
    println!();
    println!("u3 を削除しました。占有数: {}", field.occupancy());
    Ok(())
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, verbose_level)
}

/// シナリオの実行
fn execute_scenario(
    scenario: ScenarioConfig,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let mut field: RadarField<String> = RadarField::new(scenario.field.clone())?;

    println!("=== 初期配置 ===");
    place_items(&mut field, scenario.initial_items());
    println!();
    print_rings(&field);

    if let Some(rotate) = &scenario.rotate {
        println!();
        println!("=== 回転 ({:.1}度) ===", rotate.degrees);
        let plans = field.rotate(rotate.degrees, Duration::try_from_secs_f64(rotate.duration_s)?);
        for plan in &plans {
            for arc in &plan.arcs {
                println!(
                    "  {} [{}] {:.1}° → {:.1}° ({:.1}, {:.1}) → ({:.1}, {:.1})",
                    field.rings()[plan.ring].name(),
                    arc.key,
                    arc.from_angle,
                    arc.to_angle,
                    arc.from.x,
                    arc.from.y,
                    arc.to.x,
                    arc.to.y
                );
            }
        }
    }

    if let Some(replay) = scenario.replay {
        println!();
        println!("=== フィード再生 ===");
        let mut engine = SimulationEngine::new(field, replay, verbose_level);
        let stats = engine.run();
        println!("ステップ数: {}", stats.steps);
        println!("適用イベント: {}", stats.events_applied);
        println!("新規配置: {} / 移動: {} / 削除: {}", stats.placed, stats.moved, stats.removed);
        println!("配置失敗: {} / 不明キー: {}", stats.rejected, stats.missing);
        println!("最終占有: {}/{}", stats.final_occupancy, stats.capacity);
        println!();
        print_rings(&engine.field);
    }

    Ok(())
}

/// アイテムを配置し、結果をテキストビューで表示
fn place_items(field: &mut RadarField<String>, items: Vec<Item<String>>) {
    let factory = TextViewFactory;
    let preferred = field.preferred_item_size();

    for item in items {
        let key = item.key().to_string();
        let view = factory.make_view(&item, preferred);
        match field.add(item) {
            Ok(placement) => {
                let view = view.placed_at(&placement);
                println!(
                    "  {} → リング{} スロット{} {}",
                    key,
                    placement.ring + 1,
                    placement.slot,
                    view.render()
                );
            }
            Err(e) => println!("  {} → 配置失敗: {}", key, e),
        }
    }
}

/// リングごとの占有状況を表示
fn print_rings(field: &RadarField<String>) {
    println!("=== リング占有状況 ===");
    for (index, ring) in field.rings().iter().enumerate() {
        let interval = ring.interval();
        println!(
            "{}: 半径 {:.1}, 距離 [{:.1}, {:.1}), {}/{} スロット使用",
            ring.name(),
            ring.radius(),
            interval.min,
            interval.max,
            ring.occupancy(),
            ring.capacity()
        );
        for item in field.occupants_of(index) {
            println!("    - {} ({})", item.key(), item.payload);
        }
    }
    println!("合計: {}/{}", field.occupancy(), field.capacity());
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  radarfield [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("  -t, --test              デモ配置を実行");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL> ログレベル");
    println!("      --log-output <TARGET> ログ出力先 (console, file, both)");
    println!("  -h, --help              このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/nearby_users.yaml   - 近くのユーザー表示");
    println!("  scenarios/crowded_ring.yaml   - 満杯リングと距離なしアイテム");
    println!();
    println!("例:");
    println!("  radarfield -s scenarios/nearby_users.yaml");
    println!("  radarfield -s scenarios/nearby_users.yaml -vv");
    println!("  radarfield -s scenarios/crowded_ring.yaml -i");
    println!("  radarfield --test");
}
