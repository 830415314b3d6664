use formguard::{ActionEvaluator, GuardError, MemoryStore, ViewRenderer, ViewType};
use serde_json::Value;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 6 {
        print_usage();
        process::exit(2);
    }

    match run(&args[1..]) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(2);
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  formguard <store.yaml> render <user> <entity> <view> [data.json]");
    eprintln!("  formguard <store.yaml> can <user> <entity> <action> [record.json]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  formguard store.yaml render u-17 purchase_order list rows.json");
    eprintln!("  formguard store.yaml can u-17 purchase_order edit po-1001.json");
}

fn run(args: &[String]) -> Result<i32, GuardError> {
    let store = MemoryStore::from_path(&args[0])?;
    let (command, user, entity, target) = (&args[1], &args[2], &args[3], &args[4]);
    let data = args.get(5).map(|path| read_json(path)).transpose()?;

    match command.as_str() {
        "render" => {
            let view: ViewType = target.parse()?;
            let data = data.unwrap_or(Value::Null);
            let html = ViewRenderer::new(&store).render_view(user, entity, view, &data)?;
            println!("{}", html);
            Ok(0)
        }
        "can" => {
            let allowed = ActionEvaluator::new(&store).can_perform_action(
                user,
                entity,
                target,
                data.as_ref(),
            );
            if allowed {
                println!("allowed");
                Ok(0)
            } else {
                println!("denied");
                Ok(1)
            }
        }
        other => {
            eprintln!("Unknown command '{}'", other);
            print_usage();
            Ok(2)
        }
    }
}

fn read_json(path: &str) -> Result<Value, GuardError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
