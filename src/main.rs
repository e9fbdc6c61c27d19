use clap::{Arg, Command};
use log::LevelFilter;
use spamscan::config::Config;
use spamscan::filter::FilterEngine;
use spamscan::message::ParsedMessage;
use spamscan::rules::header::HeaderRule;
use std::process;

fn main() {
    let matches = Command::new("spamscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-based header spam scorer")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/spamscan.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity and report each rule")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("scan")
                .long("scan")
                .value_name("FILE")
                .help("Scan a raw message file against the rule set")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if let Some(message_file) = matches.get_one::<String>("scan") {
        scan_message_file(&config, message_file);
        return;
    }

    eprintln!("No action specified; try --scan <FILE> or --test-config");
    process::exit(2);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Required score: {}", config.required_score);
    println!("Number of rules: {}", config.rules.len());

    let mut failed = 0;
    for def in &config.rules {
        match HeaderRule::parse(&def.name, &def.header, def.score, def.describe.clone()) {
            Ok(_) => println!("  ✅ {}: {}", def.name, def.header),
            Err(e) => {
                failed += 1;
                println!("  ❌ {}: {e}", def.name);
            }
        }
    }

    println!();
    if failed == 0 {
        println!("All rules compiled successfully.");
    } else {
        println!("❌ Configuration validation failed: {failed} bad rule(s)");
        process::exit(1);
    }
}

fn scan_message_file(config: &Config, message_file: &str) {
    println!("🧪 Scanning message file: {message_file}");
    println!();

    let content = match std::fs::read_to_string(message_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading message file: {e}");
            process::exit(1);
        }
    };

    let msg = ParsedMessage::parse(&content);
    if let Some(from) = msg.get_decoded_header("From").first() {
        println!("   From: {from}");
    }
    if let Some(subject) = msg.get_decoded_header("Subject").first() {
        println!("   Subject: {subject}");
    }
    println!();

    let engine = FilterEngine::new(config.clone());
    let report = engine.scan(&msg);

    if report.matched.is_empty() {
        println!("No rules matched.");
    } else {
        println!("Matched rules:");
        for name in &report.matched {
            let describe = engine
                .rules()
                .iter()
                .find(|r| &r.name == name)
                .and_then(|r| r.describe.as_deref())
                .unwrap_or("");
            println!("  • {name} {describe}");
        }
    }
    println!();
    println!(
        "Score: {:.1} / required {:.1} => {}",
        report.score,
        config.required_score,
        if report.is_spam { "SPAM" } else { "ham" }
    );

    if report.is_spam {
        process::exit(1);
    }
}
