//! NLSL CLI - проверка, экспорт и запуск шейдеров.
//!
//! Использование:
//!   nlsl check <kind> <file>   - проверить шейдер
//!   nlsl glsl <kind> <file>    - экспортировать в GLSL
//!   nlsl run <bundle>          - выполнить набор шейдеров
//!   nlsl --help                - справка

use std::env;
use std::fs;
use std::process;
use std::time::Duration;

use log::info;

use nlsl_lang::arrangement::{uniform_rect, Fragment};
use nlsl_lang::service::{check, compile_glsl, CompileFailure};
use nlsl_lang::{Bundle, DeviceProfile, NlslResult, ShaderKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
NLSL - shader compiler and runtime for actuator displays

USAGE:
    nlsl check <kind> <file> [--json]   Parse and type-check a shader
    nlsl glsl <kind> <file>             Print the shader as GLSL
    nlsl run <bundle> [OPTIONS]         Execute a shader bundle
    nlsl --help, -h                     Show this help
    nlsl --version, -v                  Show version

KINDS:
    geometry, fragment, pixel

RUN OPTIONS:
    --profile <file.json>        Device profile, e.g. {"pixel_resolution": [2, 2]}
    --arrangement <file.json>    Array of {"position": [x,y,z], "normal": [x,y,z]}
    --ticks <n>                  Number of ticks to execute (default 1)
    --step <seconds>             iGlobalTime step between ticks (default 0.04)

A bundle is a directory or ZIP archive with geometry.*, fragment.* and
pixel.* sources. Without --arrangement a 11x11 lattice is used.

ENVIRONMENT:
    RUST_LOG=debug               Enable diagnostic logging
"#;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", HELP);
        return;
    };

    let result = match command.as_str() {
        "--help" | "-h" => {
            println!("{}", HELP);
            Ok(())
        }
        "--version" | "-v" => {
            println!("NLSL {}", VERSION);
            Ok(())
        }
        "check" => run_check(&args[1..]),
        "glsl" => run_glsl(&args[1..]),
        "run" => run_bundle(&args[1..]),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// `<kind> <file>` - общие аргументы `check` и `glsl`.
fn source_args(args: &[String]) -> NlslResult<(ShaderKind, String, String)> {
    let (Some(kind), Some(path)) = (args.first(), args.get(1)) else {
        eprintln!("Expected <kind> <file>.");
        eprintln!("Use --help for usage information.");
        process::exit(1);
    };
    let kind: ShaderKind = kind.parse()?;
    let source = fs::read_to_string(path)?;
    Ok((kind, path.clone(), source))
}

fn report(path: &str, failure: &CompileFailure, json: bool) -> NlslResult<()> {
    if json {
        eprintln!("{}", serde_json::to_string(failure)?);
    } else {
        let column = failure
            .location
            .column
            .map(|c| format!(":{}", c))
            .unwrap_or_default();
        eprintln!(
            "{}:{}{}: {} error: {}",
            path, failure.location.line, column, failure.kind, failure.reason
        );
    }
    process::exit(1);
}

fn run_check(args: &[String]) -> NlslResult<()> {
    let (kind, path, source) = source_args(args)?;
    let json = args.iter().any(|a| a == "--json");
    match check(kind, &source) {
        Ok(program) => {
            let used = program.used_uniforms();
            println!(
                "{}: ok ({} shader, {} functions, {} uniforms used)",
                path,
                kind,
                program.user_functions().count(),
                used.len()
            );
            Ok(())
        }
        Err(failure) => report(&path, &failure, json),
    }
}

fn run_glsl(args: &[String]) -> NlslResult<()> {
    let (kind, path, source) = source_args(args)?;
    match compile_glsl(kind, &source) {
        Ok(text) => {
            print!("{}", text);
            Ok(())
        }
        Err(failure) => report(&path, &failure, false),
    }
}

fn option<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn number<T: std::str::FromStr>(args: &[String], name: &str, default: T) -> T {
    match option(args, name) {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            eprintln!("Invalid value for {}: {}", name, text);
            process::exit(1);
        }),
    }
}

fn run_bundle(args: &[String]) -> NlslResult<()> {
    let Some(path) = args.first() else {
        eprintln!("Expected <bundle>.");
        eprintln!("Use --help for usage information.");
        process::exit(1);
    };

    let profile: DeviceProfile = match option(args, "--profile") {
        Some(file) => serde_json::from_str(&fs::read_to_string(file)?)?,
        None => DeviceProfile::default(),
    };
    let arrangement: Vec<Fragment> = match option(args, "--arrangement") {
        Some(file) => serde_json::from_str(&fs::read_to_string(file)?)?,
        None => uniform_rect(10, 10, 1.0, 1.0),
    };
    let ticks: u32 = number(args, "--ticks", 1);
    let step: f64 = number(args, "--step", 0.04);
    if !(step.is_finite() && step >= 0.0) {
        eprintln!("Invalid value for --step: {}", step);
        process::exit(1);
    }

    let bundle = Bundle::open(path)?;
    info!("bundle {} provides {:?}", path, bundle.kinds());

    let mut engine = bundle.build_engine(profile)?;
    engine.set_arrangement(arrangement);

    for tick in 0..ticks {
        let elapsed = Duration::try_from_secs_f64(step * f64::from(tick)).unwrap_or(Duration::MAX);
        let frame = engine.execute_at(elapsed)?;
        println!("{}", serde_json::to_string(&frame)?);
    }
    Ok(())
}
